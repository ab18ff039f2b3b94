use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{compile_all, count_matches};
use crate::matching::round2;
use crate::domain::call::{CallOutcome, Sentiment};

const MAX_CONFIDENCE: f64 = 0.95;
const NO_OUTCOME_SIGNAL_CONFIDENCE: f64 = 0.3;
const NO_SENTIMENT_SIGNAL_CONFIDENCE: f64 = 0.6;
const MIXED_SENTIMENT_CONFIDENCE: f64 = 0.7;
const MIXED_SENTIMENT_RATIO: f64 = 0.6;

static BOOKED_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(deal|booked|confirmed|agreed|accept|i'll take it|let's do it|sounds good|perfect|you got it)\b",
        r"(?i)\b(sign me up|count me in|works for me)\b",
    ])
});

static REJECTED_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(no thanks|not interested|pass|can't do it|won't work|too (low|high|far))\b",
        r"(?i)\b(decline|reject|no deal)\b",
    ])
});

static NEGOTIATED_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(think about it|call you back|let me check|need to discuss|get back to you)\b",
        r"(?i)\b(partial|maybe|considering|will review)\b",
    ])
});

static POSITIVE_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(great|excellent|perfect|wonderful|fantastic|happy|pleased|excited)\b",
        r"(?i)\b(appreciate|thank you|thanks|love|best)\b",
        r"(?i)\b(easy|smooth|quick|simple)\b",
    ])
});

static NEGATIVE_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(frustrated|upset|angry|disappointed|terrible|awful|horrible)\b",
        r"(?i)\b(waste|problem|issue|concern|difficult|complicated)\b",
        r"(?i)\b(not happy|unhappy|dissatisfied)\b",
    ])
});

static NEUTRAL_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(okay|fine|alright|understood|noted)\b",
        r"(?i)\b(standard|normal|typical|regular)\b",
    ])
});

static SHOUTED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("shouted word pattern should be valid"));

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallClassification {
    pub outcome: CallOutcome,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub outcome_confidence: f64,
    pub sentiment_confidence: f64,
}

/// Classifies the call outcome. A declared outcome is trusted only when the transcript carries at
/// least one keyword supporting it.
pub fn classify_outcome(transcript: &str, declared: Option<CallOutcome>) -> (CallOutcome, f64) {
    let lowered = transcript.to_lowercase();
    let scores = [
        (CallOutcome::Booked, count_matches(&BOOKED_KEYWORDS, &lowered) as f64),
        (CallOutcome::Rejected, count_matches(&REJECTED_KEYWORDS, &lowered) as f64),
        (CallOutcome::Negotiated, count_matches(&NEGOTIATED_KEYWORDS, &lowered) as f64),
    ];

    if let Some(declared) = declared {
        let support = scores
            .iter()
            .find(|(outcome, _)| *outcome == declared)
            .map(|(_, score)| *score)
            .unwrap_or_default();
        if support > 0.0 {
            return (declared, round2(MAX_CONFIDENCE.min(0.6 + support * 0.1)));
        }
    }

    match dominant(&scores) {
        Some((outcome, confidence)) => (outcome, confidence),
        None => (CallOutcome::Negotiated, NO_OUTCOME_SIGNAL_CONFIDENCE),
    }
}

pub fn classify_sentiment(transcript: &str) -> (Sentiment, f64) {
    let lowered = transcript.to_lowercase();
    let mut positive = count_matches(&POSITIVE_KEYWORDS, &lowered) as f64;
    let mut negative = count_matches(&NEGATIVE_KEYWORDS, &lowered) as f64;
    let neutral = count_matches(&NEUTRAL_KEYWORDS, &lowered) as f64;

    positive += transcript.matches('!').count() as f64 * 0.5;

    if transcript.matches('?').count() > 5 {
        negative += 0.5;
    }

    // Shouting only amplifies an already negative call.
    let shouted = SHOUTED_WORD.find_iter(transcript).count();
    if shouted > 2 && negative > 0.0 {
        negative += shouted as f64 * 0.3;
    }

    if positive > 0.0 && negative > 0.0 {
        let ratio = positive.min(negative) / positive.max(negative);
        if ratio > MIXED_SENTIMENT_RATIO {
            return (Sentiment::Neutral, MIXED_SENTIMENT_CONFIDENCE);
        }
    }

    let scores =
        [(Sentiment::Positive, positive), (Sentiment::Negative, negative), (Sentiment::Neutral, neutral)];
    dominant(&scores).unwrap_or((Sentiment::Neutral, NO_SENTIMENT_SIGNAL_CONFIDENCE))
}

pub fn classify_call(transcript: &str, declared: Option<CallOutcome>) -> CallClassification {
    let (outcome, outcome_confidence) = classify_outcome(transcript, declared);
    let (sentiment, sentiment_confidence) = classify_sentiment(transcript);

    CallClassification {
        outcome,
        sentiment,
        confidence: round2((outcome_confidence + sentiment_confidence) / 2.0),
        outcome_confidence,
        sentiment_confidence,
    }
}

/// Highest-scoring label with a dominance-based confidence. Earlier entries win ties.
fn dominant<T: Copy>(scores: &[(T, f64)]) -> Option<(T, f64)> {
    let total: f64 = scores.iter().map(|(_, score)| score).sum();
    let (label, best) = scores.iter().copied().fold(None, |best: Option<(T, f64)>, candidate| {
        match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        }
    })?;

    if best <= 0.0 {
        return None;
    }

    Some((label, round2(MAX_CONFIDENCE.min(0.5 + best / (total + 1.0) * 0.4))))
}
