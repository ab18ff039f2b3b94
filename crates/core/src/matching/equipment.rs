use std::collections::BTreeSet;

/// Trailer categories that count as a full match whenever both sides mention them.
pub const EQUIPMENT_CATEGORIES: [&str; 3] = ["dry van", "reefer", "flatbed"];

/// Token-overlap matches are scaled below a full match.
pub const PARTIAL_MATCH_SCALE: f64 = 0.8;

#[derive(Clone, Copy, Debug, Default)]
pub struct EquipmentMatcher;

impl EquipmentMatcher {
    pub fn score(&self, requested: &str, candidate: &str) -> f64 {
        let requested = requested.trim().to_lowercase();
        let candidate = candidate.trim().to_lowercase();

        if requested == candidate {
            return 1.0;
        }

        let same_category = EQUIPMENT_CATEGORIES
            .iter()
            .any(|category| requested.contains(category) && candidate.contains(category));
        if same_category {
            return 1.0;
        }

        let requested_tokens: BTreeSet<&str> = requested.split_whitespace().collect();
        let candidate_tokens: BTreeSet<&str> = candidate.split_whitespace().collect();
        let common = requested_tokens.intersection(&candidate_tokens).count();
        if common == 0 {
            return 0.0;
        }

        let widest = requested_tokens.len().max(candidate_tokens.len());
        common as f64 / widest as f64 * PARTIAL_MATCH_SCALE
    }
}
