//! `/api/v1` routes used by the voice agent and the dashboard.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{StatusCode, Uri},
    middleware,
    routing::{get, post},
    Json, Router,
};
use freightdesk_core::config::AppConfig;
use freightdesk_core::domain::call::{CallLogFilter, CallStats, DEFAULT_CALL_LOG_LIMIT};
use freightdesk_core::transcript::{
    classify_call, extract_call_data, CallClassification, CallExtraction,
};
use freightdesk_core::{
    ApplicationError, CallId, CallLog, CallOutcome, CarrierRegistry, CarrierVerification,
    DomainError, InterfaceError, LoadCatalog, LoadId, LoadScorer, LoadSearchService,
    NegotiationPolicy, NewCallLog, OfferContext, OfferEvaluator, ScoredLoad, SearchCriteria,
    Sentiment,
};
use freightdesk_db::repositories::{CallLogRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{require_api_key, ApiKeyAuth};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<LoadCatalog>,
    pub search: LoadSearchService,
    pub default_limit: usize,
    pub evaluator: OfferEvaluator,
    pub policy: NegotiationPolicy,
    pub carriers: Arc<dyn CarrierRegistry>,
    pub call_logs: Arc<dyn CallLogRepository>,
    pub auth: Option<ApiKeyAuth>,
}

impl AppState {
    /// Wires the domain services from configuration. When `auth.required` is set the API key
    /// must be present, otherwise the API is served without a key check.
    pub fn from_config(
        config: &AppConfig,
        catalog: LoadCatalog,
        carriers: Arc<dyn CarrierRegistry>,
        call_logs: Arc<dyn CallLogRepository>,
    ) -> Result<Self, ApplicationError> {
        let auth = match (config.auth.required, config.auth.expected_key()) {
            (true, Some(key)) => Some(ApiKeyAuth::new(key)),
            (true, None) => {
                return Err(ApplicationError::Configuration(
                    "auth.api_key must be set when auth.required = true".to_string(),
                ))
            }
            (false, _) => None,
        };

        Ok(Self {
            catalog: Arc::new(catalog),
            search: LoadSearchService::new(LoadScorer::new(
                config.matching.weights,
                config.matching.min_score,
            )?),
            default_limit: config.matching.default_limit,
            evaluator: OfferEvaluator::new(config.negotiation.guardrails()?),
            policy: config.negotiation.policy(),
            carriers,
            call_logs,
            auth,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

impl From<&InterfaceError> for ApiError {
    fn from(interface: &InterfaceError) -> Self {
        Self {
            error: interface.user_message().to_string(),
            detail: interface.detail().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }
    }
}

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/verify_carrier", post(verify_carrier))
        .route("/search_loads", post(search_loads))
        .route("/evaluate_offer", post(evaluate_offer))
        .route("/extract_call_data", post(extract_call))
        .route("/classify_call", post(classify))
        .route("/log_call", post(log_call))
        .route("/call_logs", get(call_logs))
        .route("/call_stats", get(call_stats));

    let routes = match state.auth.clone() {
        Some(auth) => routes.route_layer(middleware::from_fn_with_state(auth, require_api_key)),
        None => routes,
    };

    routes.with_state(state)
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyCarrierRequest {
    pub mc_number: String,
}

async fn verify_carrier(
    State(state): State<AppState>,
    payload: Result<Json<VerifyCarrierRequest>, JsonRejection>,
) -> Result<Json<CarrierVerification>, ApiFailure> {
    let request = json_body(payload, "verify_carrier")?;
    let verification = state.carriers.verify(&request.mc_number).await;

    info!(
        event_name = "api.verify_carrier.completed",
        mc_number = %request.mc_number,
        eligible = verification.eligible,
        "carrier verification completed"
    );
    Ok(Json(verification))
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchLoadsRequest {
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
    #[serde(default, alias = "pickup_date")]
    pub optional_pickup_date: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchLoadsResponse {
    pub status: String,
    pub loads: Vec<ScoredLoad>,
    pub total_matches: usize,
}

async fn search_loads(
    State(state): State<AppState>,
    payload: Result<Json<SearchLoadsRequest>, JsonRejection>,
) -> Result<Json<SearchLoadsResponse>, ApiFailure> {
    let request = json_body(payload, "search_loads")?;
    let limit = request.limit.unwrap_or(state.default_limit);
    if limit == 0 {
        return Err(failure(
            DomainError::InvalidArgument("limit must be at least 1".to_string()).into(),
            "search_loads",
        ));
    }

    let mut criteria =
        SearchCriteria::new(request.origin, request.destination, request.equipment_type)
            .with_limit(limit);
    if let Some(pickup_date) = request.optional_pickup_date.filter(|date| !date.trim().is_empty()) {
        criteria = criteria.with_pickup_date(pickup_date);
    }

    let loads = state.search.search(&criteria, state.catalog.loads());
    info!(
        event_name = "api.search_loads.completed",
        origin = %criteria.origin,
        destination = %criteria.destination,
        equipment_type = %criteria.equipment_type,
        total_matches = loads.len(),
        "load search completed"
    );

    Ok(Json(SearchLoadsResponse {
        status: "success".to_string(),
        total_matches: loads.len(),
        loads,
    }))
}

#[derive(Clone, Debug, Deserialize)]
pub struct EvaluateOfferRequest {
    pub original_rate: f64,
    pub counter_rate: f64,
    pub load_id: String,
    #[serde(default)]
    pub negotiation_round: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationGuidance {
    pub round: i64,
    pub strategy: String,
    pub guidance: String,
    pub escalate: bool,
    pub escalation_message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluateOfferResponse {
    pub decision: String,
    pub suggested_rate: Option<f64>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiation: Option<NegotiationGuidance>,
}

async fn evaluate_offer(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateOfferRequest>, JsonRejection>,
) -> Result<Json<EvaluateOfferResponse>, ApiFailure> {
    let request = json_body(payload, "evaluate_offer")?;

    let negotiation = match request.negotiation_round {
        Some(round) if round < 1 => {
            return Err(failure(
                DomainError::InvalidArgument("negotiation_round must be at least 1".to_string())
                    .into(),
                "evaluate_offer",
            ))
        }
        Some(round) => {
            let strategy = state.policy.strategy_for(round);
            let escalation = state.policy.should_escalate(round);
            Some(NegotiationGuidance {
                round,
                strategy: strategy.as_str().to_string(),
                guidance: strategy.guidance().to_string(),
                escalate: escalation.escalate,
                escalation_message: escalation.message,
            })
        }
        None => None,
    };

    let offer = OfferContext {
        original_rate: request.original_rate,
        counter_rate: request.counter_rate,
        load_id: LoadId(request.load_id),
    };
    let decision =
        state.evaluator.evaluate(&offer).map_err(|error| failure(error.into(), "evaluate_offer"))?;

    info!(
        event_name = "api.evaluate_offer.completed",
        load_id = %offer.load_id.0,
        original_rate = offer.original_rate,
        counter_rate = offer.counter_rate,
        decision = decision.kind().as_str(),
        "offer evaluated"
    );

    Ok(Json(EvaluateOfferResponse {
        decision: decision.kind().as_str().to_string(),
        suggested_rate: decision.suggested_rate(),
        reason: decision.reason().to_string(),
        negotiation,
    }))
}

#[derive(Clone, Debug, Deserialize)]
pub struct TranscriptRequest {
    pub call_transcript: String,
    #[serde(default)]
    pub outcome: Option<String>,
}

async fn extract_call(
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<CallExtraction>, ApiFailure> {
    let request = json_body(payload, "extract_call_data")?;
    let extraction = extract_call_data(&request.call_transcript);

    info!(
        event_name = "api.extract_call_data.completed",
        load_id = extraction.load_id.as_ref().map(|id| id.0.as_str()).unwrap_or(""),
        negotiation_rounds = extraction.negotiation_rounds,
        "call data extracted"
    );
    Ok(Json(extraction))
}

async fn classify(
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<CallClassification>, ApiFailure> {
    let request = json_body(payload, "classify_call")?;
    // An unrecognised declared outcome is ignored and the transcript decides.
    let declared =
        request.outcome.as_deref().and_then(|outcome| outcome.parse::<CallOutcome>().ok());
    let classification = classify_call(&request.call_transcript, declared);

    info!(
        event_name = "api.classify_call.completed",
        outcome = classification.outcome.as_str(),
        sentiment = classification.sentiment.as_str(),
        confidence = classification.confidence,
        "call classified"
    );
    Ok(Json(classification))
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogCallRequest {
    pub carrier_mc: String,
    #[serde(default)]
    pub carrier_name: Option<String>,
    #[serde(default)]
    pub load_id: Option<String>,
    #[serde(default)]
    pub loadboard_rate: Option<f64>,
    #[serde(default)]
    pub agreed_rate: Option<f64>,
    #[serde(default)]
    pub negotiation_rounds: u32,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub call_duration_seconds: u32,
}

impl LogCallRequest {
    fn into_new_call_log(self) -> Result<NewCallLog, DomainError> {
        if self.carrier_mc.trim().is_empty() {
            return Err(DomainError::InvalidArgument("carrier_mc is required".to_string()));
        }

        let outcome = match self.outcome.as_deref() {
            Some(outcome) => outcome.parse::<CallOutcome>()?,
            None => CallOutcome::Negotiated,
        };
        let sentiment = match self.sentiment.as_deref() {
            Some(sentiment) => sentiment.parse::<Sentiment>()?,
            None => Sentiment::Neutral,
        };

        Ok(NewCallLog {
            carrier_mc: self.carrier_mc.trim().to_string(),
            carrier_name: self.carrier_name,
            load_id: self.load_id.map(LoadId),
            loadboard_rate: self.loadboard_rate,
            agreed_rate: self.agreed_rate,
            negotiation_rounds: self.negotiation_rounds,
            outcome,
            sentiment,
            notes: self.notes,
            call_duration_seconds: self.call_duration_seconds,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogCallResponse {
    pub status: String,
    pub call_id: CallId,
    pub message: String,
}

/// The voice agent sends call fields as query parameters; other clients post a JSON body.
/// A non-empty body wins.
fn log_call_request(uri: &Uri, body: &[u8]) -> Result<LogCallRequest, ApiFailure> {
    if body.iter().any(|byte| !byte.is_ascii_whitespace()) {
        return serde_json::from_slice(body).map_err(|error| {
            failure(
                DomainError::InvalidArgument(format!("invalid JSON body: {error}")).into(),
                "log_call",
            )
        });
    }

    Query::<LogCallRequest>::try_from_uri(uri).map(|Query(request)| request).map_err(|rejection| {
        failure(DomainError::InvalidArgument(rejection.body_text()).into(), "log_call")
    })
}

async fn log_call(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<LogCallResponse>, ApiFailure> {
    let request = log_call_request(&uri, &body)?;
    let entry = request.into_new_call_log().map_err(|error| failure(error.into(), "log_call"))?;
    let outcome = entry.outcome;

    let call_id = state
        .call_logs
        .insert(entry)
        .await
        .map_err(|error| failure(persistence(error), "log_call"))?;

    info!(
        event_name = "api.log_call.completed",
        call_id = %call_id,
        outcome = outcome.as_str(),
        "call logged"
    );

    Ok(Json(LogCallResponse {
        status: "success".to_string(),
        call_id,
        message: "Call logged successfully".to_string(),
    }))
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallLogsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub outcome: Option<String>,
    pub limit: Option<u32>,
}

impl CallLogsQuery {
    fn into_filter(self) -> Result<CallLogFilter, DomainError> {
        let limit = self.limit.unwrap_or(DEFAULT_CALL_LOG_LIMIT);
        if limit == 0 {
            return Err(DomainError::InvalidArgument("limit must be at least 1".to_string()));
        }

        Ok(CallLogFilter {
            start_date: self.start_date.filter(|value| !value.trim().is_empty()),
            end_date: self.end_date.filter(|value| !value.trim().is_empty()),
            outcome: self
                .outcome
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .map(str::parse::<CallOutcome>)
                .transpose()?,
            limit,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallLogsResponse {
    pub total_calls: usize,
    pub status: String,
    pub calls: Vec<CallLog>,
}

async fn call_logs(
    State(state): State<AppState>,
    query: Result<Query<CallLogsQuery>, QueryRejection>,
) -> Result<Json<CallLogsResponse>, ApiFailure> {
    let Query(query) = query.map_err(|rejection| {
        failure(DomainError::InvalidArgument(rejection.body_text()).into(), "call_logs")
    })?;
    let filter = query.into_filter().map_err(|error| failure(error.into(), "call_logs"))?;

    let calls = state
        .call_logs
        .list(&filter)
        .await
        .map_err(|error| failure(persistence(error), "call_logs"))?;

    Ok(Json(CallLogsResponse {
        total_calls: calls.len(),
        status: "success".to_string(),
        calls,
    }))
}

async fn call_stats(State(state): State<AppState>) -> Result<Json<CallStats>, ApiFailure> {
    let stats =
        state.call_logs.stats().await.map_err(|error| failure(persistence(error), "call_stats"))?;
    Ok(Json(stats))
}

fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    operation: &'static str,
) -> Result<T, ApiFailure> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            failure(DomainError::InvalidArgument(rejection.body_text()).into(), operation)
        })
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn failure(error: ApplicationError, operation: &'static str) -> ApiFailure {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(
            event_name = "api.request.failed",
            correlation_id = %interface.correlation_id(),
            operation,
            status = status.as_u16(),
            detail = %interface.detail(),
            "api request failed"
        );
    } else {
        warn!(
            event_name = "api.request.rejected",
            correlation_id = %interface.correlation_id(),
            operation,
            status = status.as_u16(),
            detail = %interface.detail(),
            "api request rejected"
        );
    }

    (status, Json(ApiError::from(&interface)))
}

#[cfg(test)]
mod tests {
    use axum::http::Uri;
    use freightdesk_core::{CallOutcome, Sentiment};

    use super::{log_call_request, CallLogsQuery, LogCallRequest};

    fn log_request() -> LogCallRequest {
        LogCallRequest {
            carrier_mc: " MC123456 ".to_string(),
            carrier_name: None,
            load_id: Some("LD001".to_string()),
            loadboard_rate: Some(2500.0),
            agreed_rate: Some(2400.0),
            negotiation_rounds: 1,
            outcome: None,
            sentiment: None,
            notes: None,
            call_duration_seconds: 90,
        }
    }

    #[test]
    fn log_request_defaults_outcome_and_sentiment() {
        let entry = log_request().into_new_call_log().expect("valid request");
        assert_eq!(entry.carrier_mc, "MC123456");
        assert_eq!(entry.outcome, CallOutcome::Negotiated);
        assert_eq!(entry.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn log_request_rejects_unknown_outcome_and_blank_carrier() {
        let unknown = LogCallRequest { outcome: Some("won".to_string()), ..log_request() };
        assert!(unknown.into_new_call_log().is_err());

        let blank = LogCallRequest { carrier_mc: "  ".to_string(), ..log_request() };
        assert!(blank.into_new_call_log().is_err());
    }

    #[test]
    fn log_call_fields_are_read_from_query_when_body_is_empty() {
        let uri: Uri = "/log_call?carrier_mc=MC345678&agreed_rate=1750.5&negotiation_rounds=2"
            .parse()
            .expect("valid uri");

        let Ok(request) = log_call_request(&uri, b"  ") else {
            panic!("query parameters should be accepted");
        };

        assert_eq!(request.carrier_mc, "MC345678");
        assert_eq!(request.agreed_rate, Some(1750.5));
        assert_eq!(request.negotiation_rounds, 2);
        assert_eq!(request.outcome, None);
    }

    #[test]
    fn log_call_body_takes_precedence_over_query() {
        let uri: Uri = "/log_call?carrier_mc=MC345678".parse().expect("valid uri");

        let Ok(request) = log_call_request(&uri, br#"{"carrier_mc": "MC456789"}"#) else {
            panic!("json body should be accepted");
        };
        assert_eq!(request.carrier_mc, "MC456789");

        let bare: Uri = "/log_call".parse().expect("valid uri");
        assert!(log_call_request(&bare, b"").is_err());
        assert!(log_call_request(&uri, b"{not json").is_err());
    }

    #[test]
    fn call_log_query_applies_default_limit_and_parses_outcome() {
        let filter = CallLogsQuery { outcome: Some("booked".to_string()), ..CallLogsQuery::default() }
            .into_filter()
            .expect("valid query");
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.outcome, Some(CallOutcome::Booked));

        assert!(CallLogsQuery { limit: Some(0), ..CallLogsQuery::default() }.into_filter().is_err());
        assert!(CallLogsQuery { outcome: Some("maybe".to_string()), ..CallLogsQuery::default() }
            .into_filter()
            .is_err());
    }
}
