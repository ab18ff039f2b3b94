use serde::{Deserialize, Serialize};

use super::{
    round2, DateMatcher, EquipmentMatcher, LocationMatcher, MatchWeights, DEFAULT_MIN_SCORE,
};
use crate::domain::load::{Load, ScoredLoad, SearchCriteria};
use crate::errors::DomainError;

/// Per-matcher scores for one load, plus the rounded weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub origin: f64,
    pub destination: f64,
    pub equipment: f64,
    pub date: f64,
    pub overall: f64,
}

#[derive(Debug, Clone)]
pub struct LoadScorer {
    weights: MatchWeights,
    min_score: f64,
    location: LocationMatcher,
    equipment: EquipmentMatcher,
    date: DateMatcher,
}

impl Default for LoadScorer {
    fn default() -> Self {
        Self::unchecked(MatchWeights::default(), DEFAULT_MIN_SCORE)
    }
}

impl LoadScorer {
    /// Rejects weight sets that do not sum to 1.0 and cutoffs outside 0.0..=1.0, so every
    /// score this scorer produces stays within 0.0..=1.0.
    pub fn new(weights: MatchWeights, min_score: f64) -> Result<Self, DomainError> {
        weights.validate()?;
        if !(0.0..=1.0).contains(&min_score) {
            return Err(DomainError::InvalidArgument(format!(
                "min_score must be in range 0.0..=1.0, got {min_score}"
            )));
        }
        Ok(Self::unchecked(weights, min_score))
    }

    fn unchecked(weights: MatchWeights, min_score: f64) -> Self {
        Self {
            weights,
            min_score,
            location: LocationMatcher,
            equipment: EquipmentMatcher,
            date: DateMatcher,
        }
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn breakdown(&self, criteria: &SearchCriteria, load: &Load) -> MatchBreakdown {
        let origin = self.location.score(&criteria.origin, &load.origin);
        let destination = self.location.score(&criteria.destination, &load.destination);
        let equipment = self.equipment.score(&criteria.equipment_type, &load.equipment_type);
        let date = self.date.score(criteria.pickup_date.as_deref(), &load.pickup_datetime);

        MatchBreakdown {
            origin,
            destination,
            equipment,
            date,
            overall: self.combine(origin, destination, equipment, date),
        }
    }

    pub fn combine(&self, origin: f64, destination: f64, equipment: f64, date: f64) -> f64 {
        round2(
            origin * self.weights.origin
                + destination * self.weights.destination
                + equipment * self.weights.equipment
                + date * self.weights.date,
        )
    }

    pub fn score(&self, criteria: &SearchCriteria, load: &Load) -> f64 {
        self.breakdown(criteria, load).overall
    }

    /// Scores every load, drops those under the cutoff, and orders the rest by descending score.
    /// Ties keep catalog order.
    pub fn rank<'a>(
        &self,
        criteria: &SearchCriteria,
        loads: impl IntoIterator<Item = &'a Load>,
    ) -> Vec<ScoredLoad> {
        let mut ranked: Vec<ScoredLoad> = loads
            .into_iter()
            .filter_map(|load| {
                let match_score = self.score(criteria, load);
                (match_score >= self.min_score)
                    .then(|| ScoredLoad { load: load.clone(), match_score })
            })
            .collect();

        // `sort_by` is stable, which is what preserves catalog order on ties.
        ranked.sort_by(|left, right| right.match_score.total_cmp(&left.match_score));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::load::{Load, LoadId, SearchCriteria};
    use crate::errors::DomainError;
    use crate::matching::{LoadScorer, MatchWeights};

    fn load(id: &str, origin: &str, destination: &str, equipment: &str, pickup: &str) -> Load {
        Load {
            load_id: LoadId(id.to_string()),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: pickup.to_string(),
            delivery_datetime: "2025-11-05T17:00:00".to_string(),
            equipment_type: equipment.to_string(),
            loadboard_rate: 2500.0,
            weight: 42_000,
            commodity_type: "Electronics".to_string(),
            notes: String::new(),
            miles: 1_400,
        }
    }

    #[test]
    fn perfect_lane_without_date_scores_point_nine_seven() {
        let scorer = LoadScorer::default();
        let criteria = SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van");
        let candidate = load("LD001", "Los Angeles, CA", "Dallas, TX", "Dry Van", "2025-11-01");

        let breakdown = scorer.breakdown(&criteria, &candidate);

        assert_eq!(breakdown.origin, 1.0);
        assert_eq!(breakdown.destination, 1.0);
        assert_eq!(breakdown.equipment, 1.0);
        assert_eq!(breakdown.date, 0.7);
        assert_eq!(breakdown.overall, 0.97);
    }

    #[test]
    fn combine_rounds_to_two_decimals() {
        let scorer = LoadScorer::default();
        assert_eq!(scorer.combine(0.5, 0.4, 0.8 / 3.0, 0.9), 0.44);
    }

    #[test]
    fn loads_below_cutoff_are_dropped_even_when_alone() {
        let scorer = LoadScorer::default();
        let criteria = SearchCriteria::new("Atlanta, GA", "Miami, FL", "Reefer");
        let candidate = load("LD009", "Seattle, WA", "Boise, ID", "Flatbed", "2025-11-01");

        assert!(scorer.rank(&criteria, [&candidate]).is_empty());
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let scorer = LoadScorer::default();
        let criteria = SearchCriteria::new("Chicago, IL", "Denver, CO", "Reefer");
        let loads = vec![
            load("LD010", "Peoria, IL", "Denver, CO", "Reefer", "2025-11-01"),
            load("LD011", "Chicago, IL", "Denver, CO", "Reefer", "2025-11-01"),
            load("LD012", "Springfield, IL", "Denver, CO", "Reefer", "2025-11-01"),
        ];

        let ranked = scorer.rank(&criteria, &loads);
        let ids: Vec<&str> = ranked.iter().map(|scored| scored.load.load_id.0.as_str()).collect();

        assert_eq!(ids, vec!["LD011", "LD010", "LD012"]);
        assert!(ranked.windows(2).all(|pair| pair[0].match_score >= pair[1].match_score));
    }

    #[test]
    fn custom_weights_change_the_total() {
        let scorer = LoadScorer::new(
            MatchWeights { origin: 0.5, destination: 0.5, equipment: 0.0, date: 0.0 },
            0.3,
        )
        .expect("weights sum to one");
        let criteria = SearchCriteria::new("Reno, NV", "Fresno, CA", "Flatbed");
        let candidate = load("LD020", "Reno, NV", "Fresno, CA", "Reefer", "2025-11-01");

        assert_eq!(scorer.score(&criteria, &candidate), 1.0);
    }

    #[test]
    fn weights_summing_above_one_are_rejected() {
        let inflated = MatchWeights { origin: 1.0, destination: 1.0, equipment: 1.0, date: 1.0 };

        let error = LoadScorer::new(inflated, 0.3).expect_err("sum of 4.0 must be rejected");

        assert!(matches!(error, DomainError::InvariantViolation(_)));
        assert!(error.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn negative_weights_and_out_of_range_cutoffs_are_rejected() {
        let negative = MatchWeights { origin: 0.6, destination: 0.6, equipment: -0.2, date: 0.0 };
        assert!(matches!(
            LoadScorer::new(negative, 0.3),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            LoadScorer::new(MatchWeights::default(), 1.5),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn scores_stay_within_unit_range_for_valid_weights() {
        let weight_sets = [
            MatchWeights::default(),
            MatchWeights { origin: 0.25, destination: 0.25, equipment: 0.25, date: 0.25 },
            MatchWeights { origin: 0.1, destination: 0.1, equipment: 0.1, date: 0.7 },
        ];
        let criteria = SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van")
            .with_pickup_date("2025-11-01");
        let loads = vec![
            load("LD001", "Los Angeles, CA", "Dallas, TX", "Dry Van", "2025-11-01"),
            load("LD002", "Los Angeles, CA", "Houston, TX", "53ft Dry Van", "2025-11-03"),
            load("LD003", "Seattle, WA", "Boise, ID", "Flatbed", "not a date"),
        ];

        for weights in weight_sets {
            let scorer = LoadScorer::new(weights, 0.0).expect("weights sum to one");
            for candidate in &loads {
                let score = scorer.score(&criteria, candidate);
                assert!((0.0..=1.0).contains(&score), "{weights:?} scored {score}");
            }
        }
    }
}
