use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Score used when no date was requested or a date could not be read.
pub const NEUTRAL_DATE_SCORE: f64 = 0.7;

/// Result of reading a date-like string: either a calendar date or nothing usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupDate {
    Parsed(NaiveDate),
    Unparseable,
}

impl PickupDate {
    /// Accepts RFC 3339 timestamps, naive `T`/space separated timestamps and bare dates.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Self::Parsed(timestamp.date_naive());
        }

        const DATETIME_FORMATS: [&str; 4] =
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
        for format in DATETIME_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
                return Self::Parsed(timestamp.date());
            }
        }

        const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Self::Parsed(date);
            }
        }

        Self::Unparseable
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DateMatcher;

impl DateMatcher {
    /// Never fails: a missing or unreadable date on either side yields the neutral score.
    pub fn score(&self, requested: Option<&str>, candidate_pickup: &str) -> f64 {
        let Some(requested) = requested.filter(|value| !value.trim().is_empty()) else {
            return NEUTRAL_DATE_SCORE;
        };

        match (PickupDate::parse(requested), PickupDate::parse(candidate_pickup)) {
            (PickupDate::Parsed(requested), PickupDate::Parsed(pickup)) => {
                score_day_gap((pickup - requested).num_days().abs())
            }
            _ => NEUTRAL_DATE_SCORE,
        }
    }
}

fn score_day_gap(days: i64) -> f64 {
    match days {
        0 => 1.0,
        1 => 0.9,
        2..=3 => 0.7,
        4..=7 => 0.5,
        _ => 0.2,
    }
}
