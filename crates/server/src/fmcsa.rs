//! Carrier verification against the FMCSA QCMobile carrier lookup API.

use std::time::Duration;

use async_trait::async_trait;
use freightdesk_core::config::CarrierConfig;
use freightdesk_core::{CarrierRegistry, CarrierVerification, McNumber};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const VERIFIED_REASON: &str = "Verified against FMCSA database";
const FOUND_WITHOUT_NAME_REASON: &str = "MC number found in FMCSA database";

#[derive(Debug, Error)]
pub enum FmcsaError {
    #[error("carrier.api_key is required when carrier.provider = \"fmcsa\"")]
    MissingApiKey,
    #[error("could not build FMCSA http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct FmcsaRegistry {
    client: Client,
    base_url: String,
    api_key: SecretString,
    max_retries: u32,
    retry_delay: Duration,
}

impl FmcsaRegistry {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self, FmcsaError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(FmcsaError::MissingApiKey);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_retries: max_retries.max(1),
            retry_delay,
        })
    }

    pub fn from_config(config: &CarrierConfig) -> Result<Self, FmcsaError> {
        let api_key = config.api_key.clone().ok_or(FmcsaError::MissingApiKey)?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    async fn lookup(&self, mc: &McNumber) -> CarrierVerification {
        let url = format!("{}/{}", self.base_url, mc.digits());

        for attempt in 1..=self.max_retries {
            let last_attempt = attempt == self.max_retries;
            let response = self
                .client
                .get(&url)
                .query(&[("webKey", self.api_key.expose_secret())])
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await;

            let backoff = match response {
                Ok(response) => match response.status() {
                    StatusCode::OK => {
                        let body = response.json::<Value>().await.unwrap_or(Value::Null);
                        return found(mc, carrier_name(&body));
                    }
                    StatusCode::NOT_FOUND => {
                        return CarrierVerification::ineligible(format!(
                            "MC number {mc} not found in FMCSA database"
                        ));
                    }
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        return CarrierVerification::ineligible(
                            "FMCSA API authentication failed. Please check API key.",
                        );
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        if last_attempt {
                            return CarrierVerification::ineligible(
                                "FMCSA API rate limit exceeded. Please try again later.",
                            );
                        }
                        self.retry_delay * attempt
                    }
                    status => {
                        if last_attempt {
                            return CarrierVerification::ineligible(format!(
                                "FMCSA API error: {}",
                                status.as_u16()
                            ));
                        }
                        self.retry_delay
                    }
                },
                Err(error) if error.is_timeout() => {
                    if last_attempt {
                        return CarrierVerification::ineligible(
                            "FMCSA API request timed out. Please try again.",
                        );
                    }
                    self.retry_delay
                }
                Err(error) => {
                    if last_attempt {
                        return CarrierVerification::ineligible(format!(
                            "Error connecting to FMCSA API: {}",
                            error.without_url()
                        ));
                    }
                    self.retry_delay
                }
            };

            warn!(
                event_name = "carrier.fmcsa.retry",
                mc_number = %mc,
                attempt,
                max_retries = self.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                "retrying FMCSA carrier lookup"
            );
            tokio::time::sleep(backoff).await;
        }

        CarrierVerification::ineligible("Unable to verify carrier after multiple attempts")
    }
}

#[async_trait]
impl CarrierRegistry for FmcsaRegistry {
    async fn verify(&self, mc_number: &str) -> CarrierVerification {
        let Ok(mc) = McNumber::parse(mc_number) else {
            return CarrierVerification::ineligible(
                "Invalid MC number format. Expected format: MC123456",
            );
        };

        let verification = self.lookup(&mc).await;
        info!(
            event_name = "carrier.fmcsa.verified",
            mc_number = %mc,
            eligible = verification.eligible,
            reason = %verification.reason,
            "FMCSA carrier lookup finished"
        );
        verification
    }
}

fn found(mc: &McNumber, name: Option<String>) -> CarrierVerification {
    match name {
        Some(name) => CarrierVerification::eligible(name, VERIFIED_REASON),
        None => CarrierVerification::eligible(mc.to_string(), FOUND_WITHOUT_NAME_REASON),
    }
}

/// The carrier record sits under `content.carrier` or directly under `carrier`.
fn carrier_name(body: &Value) -> Option<String> {
    let carrier = match body.get("content") {
        Some(content) if !content.is_null() => content.get("carrier"),
        _ => body.get("carrier"),
    }?;

    ["legalName", "dbaName"].iter().find_map(|key| {
        carrier
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use freightdesk_core::CarrierRegistry;
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use super::{carrier_name, FmcsaError, FmcsaRegistry};

    #[derive(Clone, Default)]
    struct FakeFmcsa {
        rate_limited_calls: Arc<AtomicUsize>,
    }

    async fn carrier(
        State(fake): State<FakeFmcsa>,
        Path(digits): Path<String>,
    ) -> (StatusCode, Json<Value>) {
        match digits.as_str() {
            "123456" => (
                StatusCode::OK,
                Json(json!({"content": {"carrier": {"legalName": "ABC Trucking LLC"}}})),
            ),
            "222222" => (StatusCode::OK, Json(json!({"carrier": {"legalName": "", "dbaName": "Blue Line"}}))),
            "333333" => (StatusCode::OK, Json(json!({"content": null}))),
            "401401" => (StatusCode::FORBIDDEN, Json(json!({}))),
            "429429" => {
                if fake.rate_limited_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::TOO_MANY_REQUESTS, Json(json!({})))
                } else {
                    (StatusCode::OK, Json(json!({"carrier": {"legalName": "Patient Carrier"}})))
                }
            }
            "500500" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
            _ => (StatusCode::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn spawn_fake(fake: FakeFmcsa) -> String {
        let router = Router::new().route("/carriers/{digits}", get(carrier)).with_state(fake);
        let listener =
            tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fake fmcsa");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}/carriers")
    }

    fn registry(base_url: String, max_retries: u32) -> FmcsaRegistry {
        FmcsaRegistry::new(
            base_url,
            SecretString::from("test-key".to_string()),
            Duration::from_secs(5),
            max_retries,
            Duration::from_millis(1),
        )
        .expect("registry should build")
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = FmcsaRegistry::new(
            "http://localhost",
            SecretString::from(" ".to_string()),
            Duration::from_secs(1),
            1,
            Duration::from_millis(1),
        );
        assert!(matches!(result, Err(FmcsaError::MissingApiKey)));
    }

    #[test]
    fn carrier_name_prefers_legal_name_then_dba() {
        assert_eq!(
            carrier_name(&json!({"content": {"carrier": {"legalName": "A", "dbaName": "B"}}})),
            Some("A".to_string())
        );
        assert_eq!(
            carrier_name(&json!({"carrier": {"dbaName": "B"}})),
            Some("B".to_string())
        );
        assert_eq!(carrier_name(&json!({"content": null})), None);
    }

    #[tokio::test]
    async fn invalid_format_is_rejected_without_network() {
        let registry = registry("http://127.0.0.1:9".to_string(), 1);
        let verification = registry.verify("ABC").await;
        assert!(!verification.eligible);
        assert_eq!(verification.reason, "Invalid MC number format. Expected format: MC123456");
    }

    #[tokio::test]
    async fn responses_map_to_verifications() {
        let base_url = spawn_fake(FakeFmcsa::default()).await;
        let registry = registry(base_url, 2);

        let verified = registry.verify("MC123456").await;
        assert!(verified.eligible);
        assert_eq!(verified.carrier_name.as_deref(), Some("ABC Trucking LLC"));
        assert_eq!(verified.reason, "Verified against FMCSA database");

        let dba = registry.verify("222222").await;
        assert_eq!(dba.carrier_name.as_deref(), Some("Blue Line"));

        let nameless = registry.verify("MC-333333").await;
        assert!(nameless.eligible);
        assert_eq!(nameless.carrier_name.as_deref(), Some("MC333333"));
        assert_eq!(nameless.reason, "MC number found in FMCSA database");

        let missing = registry.verify("MC999999").await;
        assert!(!missing.eligible);
        assert_eq!(missing.reason, "MC number MC999999 not found in FMCSA database");

        let forbidden = registry.verify("MC401401").await;
        assert_eq!(forbidden.reason, "FMCSA API authentication failed. Please check API key.");

        let failing = registry.verify("MC500500").await;
        assert_eq!(failing.reason, "FMCSA API error: 500");
    }

    #[tokio::test]
    async fn rate_limited_lookup_is_retried() {
        let fake = FakeFmcsa::default();
        let calls = fake.rate_limited_calls.clone();
        let registry = registry(spawn_fake(fake).await, 3);

        let verification = registry.verify("MC429429").await;

        assert!(verification.eligible);
        assert_eq!(verification.carrier_name.as_deref(), Some("Patient Carrier"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rate_limit_on_last_attempt_is_reported() {
        let registry = registry(spawn_fake(FakeFmcsa::default()).await, 1);
        let verification = registry.verify("MC429429").await;
        assert!(!verification.eligible);
        assert_eq!(verification.reason, "FMCSA API rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn unreachable_service_reports_connection_error() {
        let registry = registry("http://127.0.0.1:9/carriers".to_string(), 1);
        let verification = registry.verify("MC123456").await;
        assert!(!verification.eligible);
        assert!(verification.reason.starts_with("Error connecting to FMCSA API"));
    }
}
