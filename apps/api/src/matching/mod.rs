// Resume-to-job matching: download, validate, extract, analyze, rank.
// All LLM calls go through the analyzer; no direct completion calls here.

pub mod download;
pub mod handlers;
pub mod pipeline;
pub mod ranker;
