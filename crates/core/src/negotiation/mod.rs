//! Rate negotiation: guardrail evaluation of a single counter-offer and round-based policy.

pub mod evaluator;
pub mod policy;

pub use evaluator::{Guardrails, OfferEvaluator, DEFAULT_CEILING_PCT, DEFAULT_FLOOR_PCT};
pub use policy::{Escalation, NegotiationPolicy, Strategy, DEFAULT_MAX_ROUNDS};
