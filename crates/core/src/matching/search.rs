use super::LoadScorer;
use crate::domain::load::{Load, ScoredLoad, SearchCriteria};

/// Runs the scorer over a catalog snapshot and keeps the top `criteria.limit` results.
///
/// The catalog is borrowed read-only, so one snapshot can serve concurrent searches.
#[derive(Debug, Clone, Default)]
pub struct LoadSearchService {
    scorer: LoadScorer,
}

impl LoadSearchService {
    pub fn new(scorer: LoadScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &LoadScorer {
        &self.scorer
    }

    /// An empty catalog or no load above the cutoff yields an empty result.
    pub fn search(&self, criteria: &SearchCriteria, catalog: &[Load]) -> Vec<ScoredLoad> {
        let mut ranked = self.scorer.rank(criteria, catalog);
        ranked.truncate(criteria.limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::load::{Load, LoadId, SearchCriteria};
    use crate::matching::LoadSearchService;

    fn catalog() -> Vec<Load> {
        [
            ("LD001", "Los Angeles, CA", "Dallas, TX", "Dry Van", "2025-11-01T08:00:00"),
            ("LD002", "San Diego, CA", "Dallas, TX", "53ft Dry Van", "2025-11-02T09:00:00"),
            ("LD003", "Los Angeles, CA", "Houston, TX", "Dry Van", "2025-11-04T07:00:00"),
            ("LD004", "Seattle, WA", "Portland, OR", "Reefer", "2025-11-01T10:00:00"),
            ("LD005", "Los Angeles, CA", "Dallas, TX", "Flatbed", "2025-11-12T06:00:00"),
        ]
        .into_iter()
        .map(|(id, origin, destination, equipment, pickup)| Load {
            load_id: LoadId(id.to_string()),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: pickup.to_string(),
            delivery_datetime: "2025-11-15T17:00:00".to_string(),
            equipment_type: equipment.to_string(),
            loadboard_rate: 2400.0,
            weight: 38_000,
            commodity_type: "General Freight".to_string(),
            notes: String::new(),
            miles: 1_200,
        })
        .collect()
    }

    #[test]
    fn returns_best_matches_up_to_default_limit() {
        let service = LoadSearchService::default();
        let criteria = SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van")
            .with_pickup_date("2025-11-01");

        let results = service.search(&criteria, &catalog());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].load.load_id.0, "LD001");
        assert_eq!(results[0].match_score, 1.0);
        assert!(results.windows(2).all(|pair| pair[0].match_score >= pair[1].match_score));
        assert!(results.iter().all(|scored| scored.match_score >= 0.3));
    }

    #[test]
    fn respects_explicit_limit() {
        let service = LoadSearchService::default();
        let criteria =
            SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van").with_limit(1);

        let results = service.search(&criteria, &catalog());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].load.load_id.0, "LD001");
    }

    #[test]
    fn empty_catalog_is_an_empty_result() {
        let service = LoadSearchService::default();
        let criteria = SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van");

        assert!(service.search(&criteria, &[]).is_empty());
    }

    #[test]
    fn no_load_over_cutoff_is_an_empty_result() {
        let service = LoadSearchService::default();
        let criteria = SearchCriteria::new("Miami, FL", "Atlanta, GA", "Tanker");

        assert!(service.search(&criteria, &catalog()).is_empty());
    }

    #[test]
    fn identical_inputs_score_identically() {
        let service = LoadSearchService::default();
        let criteria = SearchCriteria::new("Los Angeles, CA", "Dallas, TX", "Dry Van");

        assert_eq!(service.search(&criteria, &catalog()), service.search(&criteria, &catalog()));
    }
}
