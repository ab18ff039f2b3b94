pub mod carrier;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod matching;
pub mod negotiation;
pub mod transcript;

pub use carrier::{CarrierRegistry, CarrierVerification, McNumber, MockCarrierRegistry};
pub use catalog::{CatalogError, LoadCatalog};
pub use domain::call::{CallId, CallLog, CallOutcome, NewCallLog, Sentiment};
pub use domain::load::{Load, LoadId, ScoredLoad, SearchCriteria};
pub use domain::offer::{DecisionKind, OfferContext, OfferDecision};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use matching::{LoadScorer, LoadSearchService, MatchWeights};
pub use negotiation::{Escalation, Guardrails, NegotiationPolicy, OfferEvaluator, Strategy};
