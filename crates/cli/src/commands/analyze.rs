use std::fs;
use std::path::Path;

use freightdesk_core::transcript::{
    classify_call, extract_call_data, CallClassification, CallExtraction,
};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_INPUT};

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    extraction: CallExtraction,
    classification: CallClassification,
}

/// Runs extraction and classification over a transcript file; needs no configuration.
pub fn run(path: &Path) -> CommandResult {
    let transcript = match fs::read_to_string(path) {
        Ok(transcript) => transcript,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "invalid_input",
                format!("could not read transcript `{}`: {error}", path.display()),
                EXIT_INPUT,
            )
        }
    };

    let extraction = extract_call_data(&transcript);
    let classification = classify_call(&transcript, None);
    let message = format!(
        "{} call with {} sentiment ({} negotiation rounds)",
        classification.outcome.as_str(),
        classification.sentiment.as_str(),
        extraction.negotiation_rounds
    );

    CommandResult::success_with_data(
        "analyze",
        message,
        &AnalyzeOutput { extraction, classification },
    )
}
