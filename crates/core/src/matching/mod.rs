//! Load matching: per-field matchers, the weighted scorer and the catalog search service.

pub mod date;
pub mod equipment;
pub mod location;
pub mod scorer;
pub mod search;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub use date::{DateMatcher, PickupDate};
pub use equipment::EquipmentMatcher;
pub use location::LocationMatcher;
pub use scorer::{LoadScorer, MatchBreakdown};
pub use search::LoadSearchService;

/// Weight sums may drift this far from 1.0 through float arithmetic.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Loads scoring below this are never returned.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

pub const DEFAULT_WEIGHTS: MatchWeights =
    MatchWeights { origin: 0.3, destination: 0.3, equipment: 0.3, date: 0.1 };

/// Relative weight of each matcher in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub origin: f64,
    pub destination: f64,
    pub equipment: f64,
    pub date: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl MatchWeights {
    pub fn total(&self) -> f64 {
        self.origin + self.destination + self.equipment + self.date
    }

    /// Each weight must be a non-negative number and together they must sum to 1.0, which keeps
    /// every combined score inside 0.0..=1.0.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("origin", self.origin),
            ("destination", self.destination),
            ("equipment", self.equipment),
            ("date", self.date),
        ];
        if let Some((name, weight)) =
            fields.iter().find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(DomainError::InvalidArgument(format!(
                "{name} weight must be a non-negative number, got {weight}"
            )));
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DomainError::InvariantViolation(format!(
                "match weights must sum to 1.0, got {total}"
            )));
        }

        Ok(())
    }
}

/// Rounds half away from zero to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
