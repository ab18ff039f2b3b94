use serde::{Deserialize, Serialize};

use crate::domain::load::LoadId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferContext {
    pub original_rate: f64,
    pub counter_rate: f64,
    pub load_id: LoadId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Accept,
    Counter,
    Reject,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Counter => "counter",
            Self::Reject => "reject",
        }
    }
}

/// Outcome of a single counter-offer evaluation.
///
/// Each variant carries the rate the decision refers to: the agreed rate for `Accept`, the
/// proposed floor for `Counter`, and the board rate (informational) for `Reject`.
#[derive(Clone, Debug, PartialEq)]
pub enum OfferDecision {
    Accept { rate: f64, reason: String },
    Counter { suggested_rate: f64, reason: String },
    Reject { best_rate: f64, reason: String },
}

impl OfferDecision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Accept { .. } => DecisionKind::Accept,
            Self::Counter { .. } => DecisionKind::Counter,
            Self::Reject { .. } => DecisionKind::Reject,
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            Self::Accept { rate, .. } => *rate,
            Self::Counter { suggested_rate, .. } => *suggested_rate,
            Self::Reject { best_rate, .. } => *best_rate,
        }
    }

    /// Only a counter proposes a new rate to the carrier.
    pub fn suggested_rate(&self) -> Option<f64> {
        match self {
            Self::Counter { suggested_rate, .. } => Some(*suggested_rate),
            Self::Accept { .. } | Self::Reject { .. } => None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Accept { reason, .. }
            | Self::Counter { reason, .. }
            | Self::Reject { reason, .. } => reason,
        }
    }
}
