use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{compile_all, count_matches};
use crate::domain::load::LoadId;

pub const MAX_NOTES_LEN: usize = 500;
const QUOTE_EXCERPT_LEN: usize = 100;
const NO_NOTES: &str = "No specific notes captured.";

/// Plausible freight rates; anything outside is treated as another number in the call.
const MIN_PLAUSIBLE_RATE: f64 = 200.0;
const MAX_PLAUSIBLE_RATE: f64 = 10_000.0;

const MIN_CALL_SECONDS: u32 = 60;
const MAX_CALL_SECONDS: u32 = 1_800;
const CHARS_PER_WORD: u64 = 5;
const WORDS_PER_MINUTE: u64 = 150;

static LOAD_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"LD[-\s]?(\d{3,4})",
        r"[Ll]oad\s+[ID#]*\s*(\d{3,4})",
        r"[Ll]oad\s+[Nn]umber\s*:*\s*(\d{3,4})",
    ])
});

static RATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\$\s*([\d,]+\.?\d*)",
        r"(?i)([\d,]+)\s*dollars?",
        r"(?i)rate\s+of\s+\$?\s*([\d,]+\.?\d*)",
    ])
});

static MC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[r"MC[-\s]?(\d{5,7})", r"[Mm]otor\s+[Cc]arrier\s+[Nn]umber\s*:*\s*(\d{5,7})"])
});

static NEGOTIATION_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)what\s+about",
        r"(?i)can\s+you\s+do",
        r"(?i)how\s+about",
        r"(?i)counter",
        r"(?i)best\s+(price|rate)",
        r"(?i)meet\s+(me\s+)?in\s+the\s+middle",
        r"(?i)lower",
        r"(?i)higher",
    ])
});

static NOTE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(I'll take it|agree|deal|sounds good|works for me)", "Carrier agreed."),
        (r"(?i)(not interested|no thanks|pass|can't do it)", "Carrier declined."),
        (r"(?i)(let me\s+(think|check)|call\s+back)", "Carrier needs time to decide."),
        (r"(?i)(need\s+by|deadline|must\s+deliver)", "Has specific delivery requirements."),
        (r"(?i)(equipment|truck|trailer)", "Discussed equipment needs."),
        (r"(?i)(too\s+(low|high|far|heavy))", "Had concerns about load details."),
        (r"(?i)(detours|dead\s*head|return\s+load)", "Concerned about backhaul/deadhead."),
    ]
    .into_iter()
    .map(|(pattern, note)| {
        (Regex::new(pattern).expect("carrier note pattern should be valid"), note)
    })
    .collect()
});

static QUOTED_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted text pattern should be valid"));

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRates {
    pub original_rate: Option<f64>,
    pub agreed_rate: Option<f64>,
    pub counter_offers: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallExtraction {
    pub load_id: Option<LoadId>,
    pub original_rate: Option<f64>,
    pub agreed_rate: Option<f64>,
    pub carrier_notes: String,
    pub negotiation_rounds: u32,
    pub call_duration_seconds: u32,
    pub mc_number: Option<String>,
}

/// First load reference in the transcript, normalised to `LD` plus at least three digits.
pub fn extract_load_id(transcript: &str) -> Option<LoadId> {
    first_capture(&LOAD_ID_PATTERNS, transcript).map(|digits| LoadId(format!("LD{digits:0>3}")))
}

/// Dollar amounts in order of first mention: the first is taken as the board rate, the last as
/// the agreed rate, anything between as counter-offers.
pub fn extract_rates(transcript: &str) -> ExtractedRates {
    let mut rates: Vec<f64> = Vec::new();

    for pattern in RATE_PATTERNS.iter() {
        for captures in pattern.captures_iter(transcript) {
            let Some(raw) = captures.get(1) else { continue };
            let Ok(rate) = raw.as_str().replace(',', "").parse::<f64>() else { continue };
            if (MIN_PLAUSIBLE_RATE..=MAX_PLAUSIBLE_RATE).contains(&rate) && !rates.contains(&rate)
            {
                rates.push(rate);
            }
        }
    }

    let counter_offers =
        if rates.len() > 2 { rates[1..rates.len() - 1].to_vec() } else { Vec::new() };

    ExtractedRates {
        original_rate: rates.first().copied(),
        agreed_rate: rates.last().copied(),
        counter_offers,
    }
}

pub fn extract_mc_number(transcript: &str) -> Option<String> {
    first_capture(&MC_PATTERNS, transcript).map(|digits| format!("MC{digits}"))
}

/// Every two negotiation phrases count as one round; any phrase at all counts as at least one.
pub fn count_negotiation_rounds(transcript: &str) -> u32 {
    let phrases = count_matches(&NEGOTIATION_PHRASES, transcript) as u32;
    if phrases == 0 {
        0
    } else {
        (phrases / 2).max(1)
    }
}

pub fn extract_carrier_notes(transcript: &str, max_len: usize) -> String {
    let mut notes: Vec<String> = NOTE_RULES
        .iter()
        .filter(|(pattern, _)| pattern.is_match(transcript))
        .map(|(_, note)| (*note).to_string())
        .collect();

    if notes.is_empty() {
        if let Some(quote) = QUOTED_TEXT.captures(transcript).and_then(|captures| captures.get(1)) {
            let excerpt: String = quote.as_str().chars().take(QUOTE_EXCERPT_LEN).collect();
            notes.push(format!("Carrier said: {excerpt}"));
        }
    }

    let combined = notes.join(" ");
    if combined.is_empty() {
        return NO_NOTES.to_string();
    }

    if combined.chars().count() > max_len {
        let truncated: String = combined.chars().take(max_len.saturating_sub(3)).collect();
        return format!("{truncated}...");
    }

    combined
}

/// Rough talk time: five characters per word at 150 words per minute, clamped to 1..=30 minutes.
pub fn estimate_call_duration(transcript: &str) -> u32 {
    let chars = transcript.chars().count() as u64;
    let seconds = chars * 60 / (CHARS_PER_WORD * WORDS_PER_MINUTE);
    u32::try_from(seconds).unwrap_or(MAX_CALL_SECONDS).clamp(MIN_CALL_SECONDS, MAX_CALL_SECONDS)
}

pub fn extract_call_data(transcript: &str) -> CallExtraction {
    let rates = extract_rates(transcript);

    CallExtraction {
        load_id: extract_load_id(transcript),
        original_rate: rates.original_rate,
        agreed_rate: rates.agreed_rate,
        carrier_notes: extract_carrier_notes(transcript, MAX_NOTES_LEN),
        negotiation_rounds: count_negotiation_rounds(transcript),
        call_duration_seconds: estimate_call_duration(transcript),
        mc_number: extract_mc_number(transcript),
    }
}

fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns.iter().find_map(|pattern| {
        pattern.captures(text).and_then(|captures| captures.get(1)).map(|digits| digits.as_str())
    })
}
