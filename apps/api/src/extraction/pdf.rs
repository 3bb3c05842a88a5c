//! PDF text extraction with an ordered strategy chain.
//!
//! `LopdfStrategy` walks pages and text fragments; `PdfExtractStrategy` is the
//! whole-document fallback for files lopdf cannot decode.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use super::ExtractError;

const PDF_SIGNATURE: &[u8] = b"%PDF";

/// True when the buffer starts with the `%PDF` magic bytes.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

pub trait PdfStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Tries each strategy in order. Errors, panics and whitespace-only output fall
/// through to the next strategy.
pub(super) fn extract_with_fallback(
    strategies: &[Box<dyn PdfStrategy>],
    bytes: &[u8],
) -> Result<String, ExtractError> {
    let mut last_error: Option<anyhow::Error> = None;

    for strategy in strategies {
        debug!("Trying PDF extraction with {}", strategy.name());
        match run_isolated(strategy.as_ref(), bytes) {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {
                warn!("{} produced no text", strategy.name());
                last_error = Some(anyhow!("{} produced no text", strategy.name()));
            }
            Err(e) => {
                warn!("{} failed: {e:#}", strategy.name());
                last_error = Some(e);
            }
        }
    }

    let reason = last_error
        .map(|e| format!("{e:#}"))
        .unwrap_or_else(|| "no PDF extraction strategy registered".to_string());
    Err(ExtractError::ExtractionFailed(format!(
        "All PDF extraction methods failed. Last error: {reason}"
    )))
}

/// Runs one strategy, turning a parser panic into that strategy's error.
fn run_isolated(strategy: &dyn PdfStrategy, bytes: &[u8]) -> Result<String> {
    catch_unwind(AssertUnwindSafe(|| strategy.extract(bytes))).unwrap_or_else(|payload| {
        Err(anyhow!(
            "{} panicked: {}",
            strategy.name(),
            panic_message(payload.as_ref())
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────────────

/// Per-page extraction: fragments on a page are joined with spaces, pages with newlines.
pub struct LopdfStrategy;

impl PdfStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let mut pages = Vec::new();

        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(raw) => pages.push(join_fragments(raw.lines())),
                Err(e) => warn!("lopdf: skipping page {page_number}: {e}"),
            }
        }

        Ok(pages.join("\n"))
    }
}

pub struct PdfExtractStrategy;

impl PdfStrategy for PdfExtractStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(bytes)?;
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(decode_fragment)
            .collect();
        Ok(lines.join("\n"))
    }
}

fn join_fragments<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(decode_fragment)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Percent-decodes a text fragment. Fragments that are not valid percent-encoded
/// UTF-8 are returned unchanged.
fn decode_fragment(fragment: &str) -> String {
    if !fragment.contains('%') {
        return fragment.to_string();
    }

    let bytes = fragment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            match hex {
                Some(b) => {
                    decoded.push(b);
                    i += 3;
                    continue;
                }
                None => return fragment.to_string(),
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).unwrap_or_else(|_| fragment.to_string())
}
