use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::load::LoadId;
use crate::errors::DomainError;

pub const DEFAULT_CALL_LOG_LIMIT: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    /// `CALL_` followed by eight upper-case hex characters.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("CALL_{}", hex[..8].to_ascii_uppercase()))
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Booked,
    Negotiated,
    Rejected,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Negotiated => "negotiated",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for CallOutcome {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "booked" => Ok(Self::Booked),
            "negotiated" => Ok(Self::Negotiated),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::InvalidArgument(format!(
                "unsupported call outcome `{other}` (expected booked|negotiated|rejected)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl FromStr for Sentiment {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(DomainError::InvalidArgument(format!(
                "unsupported sentiment `{other}` (expected positive|neutral|negative)"
            ))),
        }
    }
}

/// A completed call as reported by the voice agent, before it is stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCallLog {
    pub carrier_mc: String,
    pub carrier_name: Option<String>,
    pub load_id: Option<LoadId>,
    pub loadboard_rate: Option<f64>,
    pub agreed_rate: Option<f64>,
    pub negotiation_rounds: u32,
    pub outcome: CallOutcome,
    pub sentiment: Sentiment,
    pub notes: Option<String>,
    pub call_duration_seconds: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub call_id: CallId,
    pub carrier_mc: String,
    pub carrier_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub load_id: Option<LoadId>,
    pub loadboard_rate: Option<f64>,
    pub agreed_rate: Option<f64>,
    pub negotiation_rounds: u32,
    pub outcome: CallOutcome,
    pub sentiment: Sentiment,
    pub notes: Option<String>,
    pub call_duration_seconds: u32,
}

/// Fixed-width UTC form used for storage, so lexical order matches chronological order.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl CallLog {
    pub fn from_new(call_id: CallId, timestamp: DateTime<Utc>, entry: NewCallLog) -> Self {
        Self {
            call_id,
            carrier_mc: entry.carrier_mc,
            carrier_name: entry.carrier_name,
            timestamp,
            load_id: entry.load_id,
            loadboard_rate: entry.loadboard_rate,
            agreed_rate: entry.agreed_rate,
            negotiation_rounds: entry.negotiation_rounds,
            outcome: entry.outcome,
            sentiment: entry.sentiment,
            notes: entry.notes,
            call_duration_seconds: entry.call_duration_seconds,
        }
    }
}

/// Date bounds are ISO dates or timestamps compared against the stored RFC 3339 timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub outcome: Option<CallOutcome>,
    pub limit: u32,
}

impl Default for CallLogFilter {
    fn default() -> Self {
        Self { start_date: None, end_date: None, outcome: None, limit: DEFAULT_CALL_LOG_LIMIT }
    }
}

impl CallLogFilter {
    pub fn matches(&self, log: &CallLog) -> bool {
        let timestamp = format_timestamp(&log.timestamp);
        let after_start =
            self.start_date.as_deref().map(|start| timestamp.as_str() >= start).unwrap_or(true);
        let before_end =
            self.end_date.as_deref().map(|end| timestamp.as_str() <= end).unwrap_or(true);
        let outcome_matches = self.outcome.map(|outcome| outcome == log.outcome).unwrap_or(true);
        after_start && before_end && outcome_matches
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallAverages {
    pub avg_loadboard_rate: Option<f64>,
    pub avg_agreed_rate: Option<f64>,
    pub avg_negotiation_rounds: Option<f64>,
    pub avg_call_duration: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginAnalysis {
    pub avg_discount: Option<f64>,
    pub min_agreed_rate: Option<f64>,
    pub max_agreed_rate: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub total_calls: i64,
    pub outcome_counts: BTreeMap<String, i64>,
    pub sentiment_counts: BTreeMap<String, i64>,
    pub averages: CallAverages,
    pub margin_analysis: MarginAnalysis,
}

impl CallStats {
    /// Aggregates in memory with the same semantics as the SQL store: averages and margins only
    /// consider calls where both the board rate and the agreed rate are known.
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a CallLog>) -> Self {
        let mut stats = Self::default();
        let mut priced: Vec<(f64, f64, &CallLog)> = Vec::new();

        for log in logs {
            stats.total_calls += 1;
            *stats.outcome_counts.entry(log.outcome.as_str().to_string()).or_insert(0) += 1;
            *stats.sentiment_counts.entry(log.sentiment.as_str().to_string()).or_insert(0) += 1;
            if let (Some(board), Some(agreed)) = (log.loadboard_rate, log.agreed_rate) {
                priced.push((board, agreed, log));
            }
        }

        if priced.is_empty() {
            return stats;
        }

        let count = priced.len() as f64;
        let mean = |sum: f64| Some(sum / count);

        stats.averages = CallAverages {
            avg_loadboard_rate: mean(priced.iter().map(|(board, _, _)| *board).sum()),
            avg_agreed_rate: mean(priced.iter().map(|(_, agreed, _)| *agreed).sum()),
            avg_negotiation_rounds: mean(
                priced.iter().map(|(_, _, log)| f64::from(log.negotiation_rounds)).sum(),
            ),
            avg_call_duration: mean(
                priced.iter().map(|(_, _, log)| f64::from(log.call_duration_seconds)).sum(),
            ),
        };
        stats.margin_analysis = MarginAnalysis {
            avg_discount: mean(priced.iter().map(|(board, agreed, _)| board - agreed).sum()),
            min_agreed_rate: priced.iter().map(|(_, agreed, _)| *agreed).reduce(f64::min),
            max_agreed_rate: priced.iter().map(|(_, agreed, _)| *agreed).reduce(f64::max),
        };

        stats
    }
}
