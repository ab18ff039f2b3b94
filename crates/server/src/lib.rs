pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod fmcsa;
pub mod health;

use axum::{routing::get, Json, Router};
use freightdesk_db::DbPool;
use serde::Serialize;

pub use api::{AppState, ApiError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub health: &'static str,
    pub api: &'static str,
}

/// Full HTTP surface: service info and health at the root, the authenticated API under `/api/v1`.
pub fn app_router(state: AppState, db_pool: DbPool) -> Router {
    Router::new()
        .route("/", get(service_info))
        .merge(health::router(db_pool))
        .nest("/api/v1", api::router(state))
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy",
        service: "freightdesk",
        version: env!("CARGO_PKG_VERSION"),
        health: "/health",
        api: "/api/v1",
    })
}
