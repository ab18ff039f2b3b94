use freightdesk_core::{LoadCatalog, LoadScorer, LoadSearchService, ScoredLoad, SearchCriteria};
use serde::Serialize;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_OPERATION};

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub origin: String,
    pub destination: String,
    pub equipment: String,
    pub pickup_date: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    total_matches: usize,
    loads: Vec<ScoredLoad>,
}

pub fn run(args: SearchArgs) -> CommandResult {
    let config = match load_config("search") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let limit = args.limit.unwrap_or(config.matching.default_limit);
    if limit == 0 {
        return CommandResult::failure(
            "search",
            "invalid_input",
            "--limit must be at least 1",
            EXIT_INPUT,
        );
    }

    let catalog = match LoadCatalog::from_json_file(&config.catalog.path) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("search", "catalog", error.to_string(), EXIT_OPERATION)
        }
    };

    let mut criteria =
        SearchCriteria::new(args.origin, args.destination, args.equipment).with_limit(limit);
    if let Some(pickup_date) = args.pickup_date {
        criteria = criteria.with_pickup_date(pickup_date);
    }

    let scorer = match LoadScorer::new(config.matching.weights, config.matching.min_score) {
        Ok(scorer) => scorer,
        Err(error) => {
            return CommandResult::failure(
                "search",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let service = LoadSearchService::new(scorer);
    let loads = service.search(&criteria, catalog.loads());

    let message = format!(
        "{} of {} catalog loads match {} -> {} ({})",
        loads.len(),
        catalog.len(),
        criteria.origin,
        criteria.destination,
        criteria.equipment_type
    );
    CommandResult::success_with_data(
        "search",
        message,
        &SearchOutput { total_matches: loads.len(), loads },
    )
}
