use crate::domain::offer::{OfferContext, OfferDecision};
use crate::errors::DomainError;

/// Counter-offers down to 10% under the board rate are acceptable.
pub const DEFAULT_FLOOR_PCT: f64 = 0.10;
/// Counter-offers up to 5% over the board rate are acceptable.
pub const DEFAULT_CEILING_PCT: f64 = 0.05;

/// Percentage band around the board rate inside which counter-offers are auto-accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guardrails {
    floor_pct: f64,
    ceiling_pct: f64,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self { floor_pct: DEFAULT_FLOOR_PCT, ceiling_pct: DEFAULT_CEILING_PCT }
    }
}

impl Guardrails {
    pub fn new(floor_pct: f64, ceiling_pct: f64) -> Result<Self, DomainError> {
        if !floor_pct.is_finite() || !(0.0..1.0).contains(&floor_pct) {
            return Err(DomainError::InvalidArgument(format!(
                "floor_pct must be in range 0.0..1.0, got {floor_pct}"
            )));
        }
        if !ceiling_pct.is_finite() || ceiling_pct < 0.0 {
            return Err(DomainError::InvalidArgument(format!(
                "ceiling_pct must be a non-negative fraction, got {ceiling_pct}"
            )));
        }
        Ok(Self { floor_pct, ceiling_pct })
    }

    pub fn floor_pct(&self) -> f64 {
        self.floor_pct
    }

    pub fn ceiling_pct(&self) -> f64 {
        self.ceiling_pct
    }

    pub fn floor(&self, original_rate: f64) -> f64 {
        original_rate * (1.0 - self.floor_pct)
    }

    pub fn ceiling(&self, original_rate: f64) -> f64 {
        original_rate * (1.0 + self.ceiling_pct)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfferEvaluator {
    guardrails: Guardrails,
}

impl OfferEvaluator {
    pub fn new(guardrails: Guardrails) -> Self {
        Self { guardrails }
    }

    pub fn guardrails(&self) -> Guardrails {
        self.guardrails
    }

    /// Decides how to answer a carrier's counter-offer. Stateless; every positive pair of rates
    /// yields exactly one decision.
    pub fn evaluate(&self, offer: &OfferContext) -> Result<OfferDecision, DomainError> {
        let original = validate_rate("original_rate", offer.original_rate)?;
        let counter = validate_rate("counter_rate", offer.counter_rate)?;

        let floor = self.guardrails.floor(original);
        let ceiling = self.guardrails.ceiling(original);

        let decision = if counter > original && counter <= ceiling {
            OfferDecision::Accept {
                rate: counter,
                reason: format!(
                    "Your offer of ${counter:.2} is acceptable. We can work with that rate."
                ),
            }
        } else if counter > ceiling {
            OfferDecision::Reject {
                best_rate: original,
                reason: format!(
                    "I understand you're looking for ${counter:.2}, but that's above our maximum budget. \
                     Our best rate for this load is ${original:.2}. Can you work with that?"
                ),
            }
        } else if counter == original {
            OfferDecision::Accept {
                rate: counter,
                reason: format!("Perfect! We have a deal at ${counter:.2}."),
            }
        } else if counter >= floor {
            OfferDecision::Accept {
                rate: counter,
                reason: format!("We can meet you at ${counter:.2}. That works for us."),
            }
        } else {
            let discount_pct = (original - floor) / original * 100.0;
            OfferDecision::Counter {
                suggested_rate: floor,
                reason: format!(
                    "I appreciate your offer of ${counter:.2}, but that's below our minimum for this load. \
                     The best I can do is ${floor:.2}. That's {discount_pct:.0}% off the board rate. \
                     Can we make that work?"
                ),
            }
        };

        Ok(decision)
    }
}

fn validate_rate(field: &str, rate: f64) -> Result<f64, DomainError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(DomainError::InvalidArgument(format!("{field} must be a positive amount, got {rate}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{Guardrails, OfferEvaluator};
    use crate::domain::load::LoadId;
    use crate::domain::offer::{DecisionKind, OfferContext};
    use crate::errors::DomainError;

    fn offer(original_rate: f64, counter_rate: f64) -> OfferContext {
        OfferContext { original_rate, counter_rate, load_id: LoadId("LD1".to_string()) }
    }

    #[test]
    fn matching_board_rate_is_accepted() {
        let decision = OfferEvaluator::default().evaluate(&offer(2500.0, 2500.0)).expect("valid");
        assert_eq!(decision.kind(), DecisionKind::Accept);
        assert_eq!(decision.rate(), 2500.0);
        assert_eq!(decision.suggested_rate(), None);
        assert!(decision.reason().contains("$2500.00"));
    }

    #[test]
    fn ask_above_board_within_ceiling_is_accepted() {
        let decision = OfferEvaluator::default().evaluate(&offer(2500.0, 2600.0)).expect("valid");
        assert_eq!(decision.kind(), DecisionKind::Accept);
        assert_eq!(decision.rate(), 2600.0);
    }

    #[test]
    fn ask_above_ceiling_is_rejected_with_board_rate() {
        let decision = OfferEvaluator::default().evaluate(&offer(2500.0, 2700.0)).expect("valid");
        assert_eq!(decision.kind(), DecisionKind::Reject);
        assert_eq!(decision.rate(), 2500.0);
        assert!(decision.reason().contains("above our maximum budget"));
    }

    #[test]
    fn discount_within_floor_is_accepted() {
        let decision = OfferEvaluator::default().evaluate(&offer(2500.0, 2300.0)).expect("valid");
        assert_eq!(decision.kind(), DecisionKind::Accept);
        assert_eq!(decision.rate(), 2300.0);
    }

    #[test]
    fn discount_below_floor_counters_at_floor() {
        let decision = OfferEvaluator::default().evaluate(&offer(2500.0, 2200.0)).expect("valid");
        assert_eq!(decision.kind(), DecisionKind::Counter);
        let suggested = decision.suggested_rate().expect("counter carries a rate");
        assert!((suggested - 2250.0).abs() < 1e-6);
        assert!(decision.reason().contains("$2250.00"));
        assert!(decision.reason().contains("10% off the board rate"));
    }

    #[test]
    fn band_edges_are_inclusive() {
        let evaluator = OfferEvaluator::default();

        let at_ceiling = evaluator.evaluate(&offer(2500.0, 2625.0)).expect("valid");
        assert_eq!(at_ceiling.kind(), DecisionKind::Accept);
        assert_eq!(at_ceiling.rate(), 2625.0);

        let at_floor = evaluator.evaluate(&offer(2500.0, 2250.0)).expect("valid");
        assert_eq!(at_floor.kind(), DecisionKind::Accept);
        assert_eq!(at_floor.rate(), 2250.0);

        let just_under_floor = evaluator.evaluate(&offer(2500.0, 2249.99)).expect("valid");
        assert_eq!(just_under_floor.kind(), DecisionKind::Counter);
        assert_eq!(just_under_floor.suggested_rate(), Some(2250.0));

        let just_over_ceiling = evaluator.evaluate(&offer(2500.0, 2625.01)).expect("valid");
        assert_eq!(just_over_ceiling.kind(), DecisionKind::Reject);
    }

    #[test]
    fn custom_guardrails_move_the_band() {
        let evaluator = OfferEvaluator::new(Guardrails::new(0.2, 0.0).expect("valid guardrails"));

        let within_floor = evaluator.evaluate(&offer(1000.0, 850.0)).expect("valid");
        let over_board = evaluator.evaluate(&offer(1000.0, 1001.0)).expect("valid");

        assert_eq!(within_floor.kind(), DecisionKind::Accept);
        assert_eq!(over_board.kind(), DecisionKind::Reject);
    }

    #[test]
    fn non_positive_and_nan_rates_are_rejected() {
        let evaluator = OfferEvaluator::default();
        for (original, counter) in [(0.0, 100.0), (-5.0, 100.0), (100.0, f64::NAN), (100.0, 0.0)]
        {
            let error = evaluator.evaluate(&offer(original, counter)).expect_err("invalid input");
            assert!(matches!(error, DomainError::InvalidArgument(_)));
        }
    }

    #[test]
    fn guardrails_reject_out_of_range_percentages() {
        assert!(Guardrails::new(1.0, 0.05).is_err());
        assert!(Guardrails::new(-0.1, 0.05).is_err());
        assert!(Guardrails::new(0.1, -0.05).is_err());
    }
}
