//! Rule-based mining of call transcripts: structured field extraction and outcome/sentiment
//! classification. Independent of matching and negotiation.

pub mod classification;
pub mod extraction;

use once_cell::sync::Lazy;
use regex::Regex;

pub use classification::{classify_call, classify_outcome, classify_sentiment, CallClassification};
pub use extraction::{extract_call_data, CallExtraction, ExtractedRates};

/// Compiles a static pattern table. Patterns are literals, so failure is a programming error.
pub(crate) fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("transcript pattern should be valid"))
        .collect()
}

pub(crate) fn count_matches(patterns: &Lazy<Vec<Regex>>, text: &str) -> usize {
    patterns.iter().map(|pattern| pattern.find_iter(text).count()).sum()
}
