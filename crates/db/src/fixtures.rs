use serde::Serialize;

use freightdesk_core::domain::call::{CallId, CallOutcome, NewCallLog, Sentiment};
use freightdesk_core::domain::load::LoadId;

use crate::repositories::{CallLogRepository, RepositoryError};

/// One demo call, kept as static data so the seed set is reproducible.
#[derive(Debug, Clone, Copy)]
pub struct SampleCall {
    pub carrier_mc: &'static str,
    pub carrier_name: &'static str,
    pub load_id: &'static str,
    pub loadboard_rate: f64,
    pub agreed_rate: Option<f64>,
    pub negotiation_rounds: u32,
    pub outcome: CallOutcome,
    pub sentiment: Sentiment,
    pub notes: &'static str,
    pub call_duration_seconds: u32,
}

impl SampleCall {
    pub fn to_new_call_log(&self) -> NewCallLog {
        NewCallLog {
            carrier_mc: self.carrier_mc.to_string(),
            carrier_name: Some(self.carrier_name.to_string()),
            load_id: Some(LoadId(self.load_id.to_string())),
            loadboard_rate: Some(self.loadboard_rate),
            agreed_rate: self.agreed_rate,
            negotiation_rounds: self.negotiation_rounds,
            outcome: self.outcome,
            sentiment: self.sentiment,
            notes: Some(self.notes.to_string()),
            call_duration_seconds: self.call_duration_seconds,
        }
    }
}

pub const SAMPLE_CALLS: &[SampleCall] = &[
    SampleCall {
        carrier_mc: "MC123456",
        carrier_name: "ABC Trucking",
        load_id: "LD001",
        loadboard_rate: 2500.0,
        agreed_rate: Some(2400.0),
        negotiation_rounds: 1,
        outcome: CallOutcome::Booked,
        sentiment: Sentiment::Positive,
        notes: "Quick decision, very professional",
        call_duration_seconds: 180,
    },
    SampleCall {
        carrier_mc: "MC234567",
        carrier_name: "XYZ Logistics",
        load_id: "LD002",
        loadboard_rate: 2200.0,
        agreed_rate: Some(2200.0),
        negotiation_rounds: 0,
        outcome: CallOutcome::Booked,
        sentiment: Sentiment::Positive,
        notes: "Accepted immediately",
        call_duration_seconds: 120,
    },
    SampleCall {
        carrier_mc: "MC345678",
        carrier_name: "Fast Freight",
        load_id: "LD003",
        loadboard_rate: 1800.0,
        agreed_rate: Some(1750.0),
        negotiation_rounds: 2,
        outcome: CallOutcome::Negotiated,
        sentiment: Sentiment::Neutral,
        notes: "Wanted to think about it",
        call_duration_seconds: 240,
    },
    SampleCall {
        carrier_mc: "MC456789",
        carrier_name: "Slow Haul Inc",
        load_id: "LD004",
        loadboard_rate: 1600.0,
        agreed_rate: None,
        negotiation_rounds: 1,
        outcome: CallOutcome::Rejected,
        sentiment: Sentiment::Negative,
        notes: "Rate too low, not interested",
        call_duration_seconds: 90,
    },
    SampleCall {
        carrier_mc: "MC567890",
        carrier_name: "Prime Transport",
        load_id: "LD005",
        loadboard_rate: 2800.0,
        agreed_rate: Some(2700.0),
        negotiation_rounds: 1,
        outcome: CallOutcome::Booked,
        sentiment: Sentiment::Positive,
        notes: "Minimal negotiation, booked quickly",
        call_duration_seconds: 200,
    },
    SampleCall {
        carrier_mc: "MC678901",
        carrier_name: "Elite Carriers",
        load_id: "LD006",
        loadboard_rate: 1200.0,
        agreed_rate: Some(1200.0),
        negotiation_rounds: 0,
        outcome: CallOutcome::Booked,
        sentiment: Sentiment::Positive,
        notes: "Backhaul opportunity, accepted immediately",
        call_duration_seconds: 100,
    },
    SampleCall {
        carrier_mc: "MC789012",
        carrier_name: "National Freight",
        load_id: "LD007",
        loadboard_rate: 1950.0,
        agreed_rate: Some(1900.0),
        negotiation_rounds: 2,
        outcome: CallOutcome::Negotiated,
        sentiment: Sentiment::Neutral,
        notes: "Will call back after checking schedule",
        call_duration_seconds: 280,
    },
    SampleCall {
        carrier_mc: "MC890123",
        carrier_name: "Budget Trucking",
        load_id: "LD008",
        loadboard_rate: 1400.0,
        agreed_rate: None,
        negotiation_rounds: 3,
        outcome: CallOutcome::Rejected,
        sentiment: Sentiment::Negative,
        notes: "Too far from their base, declined",
        call_duration_seconds: 320,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub removed: u64,
    pub inserted: Vec<CallId>,
}

/// Replaces the store contents with the demo call set. Running it twice leaves the same data.
pub async fn seed_sample_calls(
    repository: &dyn CallLogRepository,
) -> Result<SeedResult, RepositoryError> {
    let removed = repository.delete_all().await?;

    let mut inserted = Vec::with_capacity(SAMPLE_CALLS.len());
    for call in SAMPLE_CALLS {
        inserted.push(repository.insert(call.to_new_call_log()).await?);
    }

    Ok(SeedResult { removed, inserted })
}
