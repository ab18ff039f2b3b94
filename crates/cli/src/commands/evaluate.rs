use freightdesk_core::{LoadId, OfferContext, OfferEvaluator};
use serde::Serialize;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG, EXIT_INPUT};

#[derive(Debug, Serialize)]
struct RoundGuidance {
    round: i64,
    strategy: &'static str,
    guidance: &'static str,
    escalate: bool,
    escalation_message: String,
}

#[derive(Debug, Serialize)]
struct EvaluateOutput {
    decision: &'static str,
    suggested_rate: Option<f64>,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    negotiation: Option<RoundGuidance>,
}

pub fn run(
    original_rate: f64,
    counter_rate: f64,
    load_id: &str,
    round: Option<i64>,
) -> CommandResult {
    let config = match load_config("evaluate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let guardrails = match config.negotiation.guardrails() {
        Ok(guardrails) => guardrails,
        Err(error) => {
            return CommandResult::failure(
                "evaluate",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let negotiation = match round {
        Some(round) if round < 1 => {
            return CommandResult::failure(
                "evaluate",
                "invalid_input",
                "--round must be at least 1",
                EXIT_INPUT,
            )
        }
        Some(round) => {
            let policy = config.negotiation.policy();
            let strategy = policy.strategy_for(round);
            let escalation = policy.should_escalate(round);
            Some(RoundGuidance {
                round,
                strategy: strategy.as_str(),
                guidance: strategy.guidance(),
                escalate: escalation.escalate,
                escalation_message: escalation.message,
            })
        }
        None => None,
    };

    let offer =
        OfferContext { original_rate, counter_rate, load_id: LoadId(load_id.to_string()) };
    match OfferEvaluator::new(guardrails).evaluate(&offer) {
        Ok(decision) => CommandResult::success_with_data(
            "evaluate",
            format!("{} for load {}", decision.kind().as_str(), load_id),
            &EvaluateOutput {
                decision: decision.kind().as_str(),
                suggested_rate: decision.suggested_rate(),
                reason: decision.reason().to_string(),
                negotiation,
            },
        ),
        Err(error) => {
            CommandResult::failure("evaluate", "invalid_input", error.to_string(), EXIT_INPUT)
        }
    }
}
