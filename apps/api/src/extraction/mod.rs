// Document text extraction: PDF (strategy chain), DOCX, plain text.
// Extraction is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod docx;
pub mod pdf;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub use pdf::{has_pdf_signature, LopdfStrategy, PdfExtractStrategy, PdfStrategy};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("document contains no extractable text")]
    NoTextFound,
}

/// An uploaded or downloaded resume, before text extraction.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl ResumeDocument {
    pub fn kind(&self) -> Result<DocumentKind, ExtractError> {
        DocumentKind::resolve(self.content_type.as_deref(), self.filename.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Declared MIME type wins; the filename extension is the fallback.
    pub fn resolve(content_type: Option<&str>, filename: Option<&str>) -> Result<Self, ExtractError> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase())
            .filter(|ct| !ct.is_empty());

        if let Some(kind) = mime.as_deref().and_then(Self::from_mime) {
            return Ok(kind);
        }

        let extension = filename.and_then(file_extension);
        if let Some(kind) = extension.as_deref().and_then(Self::from_extension) {
            return Ok(kind);
        }

        let rejected = mime
            .or_else(|| extension.map(|e| format!(".{e}")))
            .unwrap_or_else(|| "unknown".to_string());
        Err(ExtractError::UnsupportedFormat(rejected))
    }

    fn from_mime(mime: &str) -> Option<Self> {
        if mime.contains("pdf") {
            Some(Self::Pdf)
        } else if mime.contains("wordprocessingml") {
            Some(Self::Docx)
        } else if mime.starts_with("text/") {
            Some(Self::Text)
        } else {
            None
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Lowercased extension of the last path segment. Query strings are ignored so
/// resume URLs resolve the same way as plain filenames.
fn file_extension(filename: &str) -> Option<String> {
    let path = filename.split(['?', '#']).next().unwrap_or(filename);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Plain text extracted from a resume. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, as reported to clients.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

/// Turns resume bytes into text. PDF strategies are tried in registration order.
pub struct DocumentExtractor {
    pdf_strategies: Vec<Box<dyn PdfStrategy>>,
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::with_pdf_strategies(vec![Box::new(LopdfStrategy), Box::new(PdfExtractStrategy)])
    }
}

impl DocumentExtractor {
    pub fn with_pdf_strategies(pdf_strategies: Vec<Box<dyn PdfStrategy>>) -> Self {
        Self { pdf_strategies }
    }

    pub fn extract(&self, document: &ResumeDocument) -> Result<ExtractedText, ExtractError> {
        let kind = document.kind()?;
        debug!("Extracting {kind:?} document ({} bytes)", document.bytes.len());

        let raw = match kind {
            DocumentKind::Pdf => pdf::extract_with_fallback(&self.pdf_strategies, &document.bytes)?,
            DocumentKind::Docx => docx::extract_text(&document.bytes)?,
            DocumentKind::Text => String::from_utf8_lossy(&document.bytes).into_owned(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::NoTextFound);
        }
        Ok(ExtractedText(trimmed.to_string()))
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::io::Cursor;

    use docx_rs::{Docx, Paragraph, Run};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Builds a PDF with one text line per page.
    pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{docx_with_paragraphs, pdf_with_pages};
    use super::*;

    fn document(bytes: Vec<u8>, content_type: Option<&str>, filename: Option<&str>) -> ResumeDocument {
        ResumeDocument {
            bytes: Bytes::from(bytes),
            content_type: content_type.map(String::from),
            filename: filename.map(String::from),
        }
    }

    #[test]
    fn test_resolve_prefers_declared_mime() {
        let kind = DocumentKind::resolve(Some("application/pdf"), Some("resume.docx")).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn test_resolve_strips_mime_parameters() {
        let kind = DocumentKind::resolve(Some("text/plain; charset=utf-8"), None).unwrap();
        assert_eq!(kind, DocumentKind::Text);
    }

    #[test]
    fn test_resolve_falls_back_to_extension() {
        let kind =
            DocumentKind::resolve(Some("application/octet-stream"), Some("https://cdn/x/CV.DOCX?token=1"))
                .unwrap();
        assert_eq!(kind, DocumentKind::Docx);
    }

    #[test]
    fn test_resolve_rejects_image_with_mime_in_error() {
        let err = DocumentKind::resolve(Some("image/png"), None).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref m) if m == "image/png"));
    }

    #[test]
    fn test_resolve_rejects_unknown_extension() {
        let err = DocumentKind::resolve(None, Some("resume.odt")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref m) if m == ".odt"));
    }

    #[test]
    fn test_extract_plain_text_is_trimmed() {
        let extracted = DocumentExtractor::default()
            .extract(&document(b"  Jane Doe\nRust engineer \n\n".to_vec(), Some("text/plain"), None))
            .unwrap();
        assert_eq!(extracted.as_str(), "Jane Doe\nRust engineer");
    }

    #[test]
    fn test_extract_whitespace_text_is_no_text_found() {
        let err = DocumentExtractor::default()
            .extract(&document(b" \n\t ".to_vec(), None, Some("notes.txt")))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoTextFound));
    }

    #[test]
    fn test_extract_pdf_fixture() {
        let bytes = pdf_with_pages(&["Jane Doe", "Skills: React"]);
        let extracted = DocumentExtractor::default()
            .extract(&document(bytes, Some("application/pdf"), None))
            .unwrap();
        assert!(extracted.as_str().contains("Jane Doe"));
        assert!(extracted.as_str().contains("React"));
        assert_eq!(extracted.as_str(), extracted.as_str().trim());
    }

    #[test]
    fn test_extract_docx_fixture() {
        let bytes = docx_with_paragraphs(&["Jane Doe", "Senior Rust Engineer"]);
        let extracted = DocumentExtractor::default()
            .extract(&document(
                bytes,
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                None,
            ))
            .unwrap();
        assert_eq!(extracted.as_str(), "Jane Doe\nSenior Rust Engineer");
    }

    #[test]
    fn test_extract_unsupported_type() {
        let err = DocumentExtractor::default()
            .extract(&document(vec![0x89, b'P', b'N', b'G'], Some("image/png"), None))
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    struct PanickingPdf;

    impl PdfStrategy for PanickingPdf {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _bytes: &[u8]) -> anyhow::Result<String> {
            panic!("unexpected end of stream");
        }
    }

    struct FixedPdf;

    impl PdfStrategy for FixedPdf {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _bytes: &[u8]) -> anyhow::Result<String> {
            Ok("Jane Doe\nRust".to_string())
        }
    }

    #[test]
    fn test_parser_panic_falls_back_to_next_strategy() {
        let extractor =
            DocumentExtractor::with_pdf_strategies(vec![Box::new(PanickingPdf), Box::new(FixedPdf)]);
        let extracted = extractor
            .extract(&document(b"%PDF-1.4 broken".to_vec(), Some("application/pdf"), None))
            .unwrap();
        assert_eq!(extracted.as_str(), "Jane Doe\nRust");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let extracted = DocumentExtractor::default()
            .extract(&document("Zoë".as_bytes().to_vec(), Some("text/plain"), None))
            .unwrap();
        assert_eq!(extracted.char_len(), 3);
    }
}
