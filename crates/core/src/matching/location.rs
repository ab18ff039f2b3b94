//! Place-string similarity between a requested lane endpoint and a load's endpoint.

pub const EXACT_SCORE: f64 = 1.0;
pub const CONTAINED_SCORE: f64 = 0.8;
pub const SAME_STATE_SCORE: f64 = 0.5;
pub const PARTIAL_CITY_SCORE: f64 = 0.4;

/// Minimum length a city token needs before partial matching is attempted.
const PARTIAL_TOKEN_MIN_LEN: usize = 4;

#[derive(Clone, Copy, Debug, Default)]
pub struct LocationMatcher;

impl LocationMatcher {
    /// Scores how well `candidate` satisfies `requested`, first matching tier wins:
    /// exact, substring either way, same trailing state token, partial city token, none.
    pub fn score(&self, requested: &str, candidate: &str) -> f64 {
        let requested = normalize(requested);
        let candidate = normalize(candidate);

        if requested == candidate {
            return EXACT_SCORE;
        }

        if candidate.contains(requested.as_str()) || requested.contains(candidate.as_str()) {
            return CONTAINED_SCORE;
        }

        let requested_tokens: Vec<&str> = requested.split(' ').collect();
        let candidate_tokens: Vec<&str> = candidate.split(' ').collect();

        if requested_tokens.len() >= 2
            && candidate_tokens.len() >= 2
            && requested_tokens.last() == candidate_tokens.last()
        {
            return SAME_STATE_SCORE;
        }

        let requested_cities = city_tokens(&requested_tokens);
        let candidate_cities = city_tokens(&candidate_tokens);
        let partial_city = requested_cities
            .iter()
            .filter(|token| token.chars().count() >= PARTIAL_TOKEN_MIN_LEN)
            .any(|token| candidate_cities.iter().any(|candidate| candidate.contains(*token)));

        if partial_city {
            PARTIAL_CITY_SCORE
        } else {
            0.0
        }
    }
}

/// Lower-cases, drops commas and collapses whitespace: `"Los Angeles, CA"` → `"los angeles ca"`.
pub fn normalize(location: &str) -> String {
    location.to_lowercase().replace(',', "").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All tokens except the trailing state abbreviation.
fn city_tokens<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    match tokens.split_last() {
        Some((_, rest)) => rest.to_vec(),
        None => Vec::new(),
    }
}
