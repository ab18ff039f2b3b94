use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROUNDS: i64 = 3;

const ESCALATION_MESSAGE: &str = "We've gone back and forth a few times. Let me connect you with my \
     manager to see if we can find a solution that works for both of us.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Flexible,
    Moderate,
    Firm,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flexible => "flexible",
            Self::Moderate => "moderate",
            Self::Firm => "firm",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Flexible => "Be accommodating and build rapport.",
            Self::Moderate => "Hold ground but show willingness to move.",
            Self::Firm => "Final offer; be ready to escalate.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub escalate: bool,
    pub message: String,
}

/// Round-based negotiation guidance. Holds no session state: the caller supplies the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NegotiationPolicy {
    max_rounds: i64,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self { max_rounds: DEFAULT_MAX_ROUNDS }
    }
}

impl NegotiationPolicy {
    pub fn new(max_rounds: i64) -> Self {
        Self { max_rounds }
    }

    pub fn max_rounds(&self) -> i64 {
        self.max_rounds
    }

    pub fn should_escalate(&self, rounds: i64) -> Escalation {
        if rounds >= self.max_rounds {
            Escalation { escalate: true, message: ESCALATION_MESSAGE.to_string() }
        } else {
            Escalation { escalate: false, message: String::new() }
        }
    }

    /// Round 1 is flexible, round 2 moderate, anything else firm.
    pub fn strategy_for(&self, round: i64) -> Strategy {
        match round {
            1 => Strategy::Flexible,
            2 => Strategy::Moderate,
            _ => Strategy::Firm,
        }
    }
}
