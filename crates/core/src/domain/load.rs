use serde::{Deserialize, Serialize};

pub const DEFAULT_RESULT_LIMIT: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadId(pub String);

/// A load posted on the board. Reference data owned by the catalog; matching only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub load_id: LoadId,
    pub origin: String,
    pub destination: String,
    pub pickup_datetime: String,
    pub delivery_datetime: String,
    pub equipment_type: String,
    pub loadboard_rate: f64,
    pub weight: u32,
    pub commodity_type: String,
    #[serde(default)]
    pub notes: String,
    pub miles: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
    pub pickup_date: Option<String>,
    pub limit: usize,
}

impl SearchCriteria {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        equipment_type: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            equipment_type: equipment_type.into(),
            pickup_date: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_pickup_date(mut self, pickup_date: impl Into<String>) -> Self {
        self.pickup_date = Some(pickup_date.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A load paired with its match score in `[0.0, 1.0]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredLoad {
    #[serde(flatten)]
    pub load: Load,
    pub match_score: f64,
}
