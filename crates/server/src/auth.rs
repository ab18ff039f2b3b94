//! `X-API-Key` guard for the `/api/v1` routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use freightdesk_core::InterfaceError;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use uuid::Uuid;

use crate::api::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct ApiKeyAuth {
    expected: Arc<SecretString>,
}

impl ApiKeyAuth {
    pub fn new(expected: impl Into<String>) -> Self {
        Self { expected: Arc::new(SecretString::from(expected.into())) }
    }

    pub fn accepts(&self, presented: Option<&str>) -> bool {
        presented
            .map(|key| constant_time_eq(key.as_bytes(), self.expected.expose_secret().as_bytes()))
            .unwrap_or(false)
    }
}

pub async fn require_api_key(
    State(auth): State<ApiKeyAuth>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
    if auth.accepts(presented) {
        return next.run(request).await;
    }

    let correlation_id = Uuid::new_v4().to_string();
    warn!(
        event_name = "api.auth.rejected",
        correlation_id = %correlation_id,
        path = %request.uri().path(),
        header_present = presented.is_some(),
        "rejected request with missing or invalid api key"
    );

    let message =
        if presented.is_some() { "api key mismatch" } else { "api key header missing" };
    let interface = InterfaceError::Unauthorized { message: message.to_string(), correlation_id };

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey"))],
        Json(ApiError::from(&interface)),
    )
        .into_response()
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}
