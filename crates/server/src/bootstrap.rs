use std::sync::Arc;

use freightdesk_core::config::{AppConfig, CarrierProvider, ConfigError, LoadOptions};
use freightdesk_core::{ApplicationError, CarrierRegistry, LoadCatalog, MockCarrierRegistry};
use freightdesk_db::repositories::SqlCallLogRepository;
use freightdesk_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::AppState;
use crate::fmcsa::{FmcsaError, FmcsaRegistry};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("carrier registry setup failed: {0}")]
    CarrierRegistry(#[from] FmcsaError),
    #[error("application wiring failed: {0}")]
    State(#[from] ApplicationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let catalog = load_catalog(&config);
    let carriers = carrier_registry(&config)?;
    let call_logs = Arc::new(SqlCallLogRepository::new(db_pool.clone()));
    let state = AppState::from_config(&config, catalog, carriers, call_logs)?;
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        auth_enabled = state.auth.is_some(),
        "application services wired"
    );

    Ok(Application { config, db_pool, state })
}

/// A catalog that cannot be read degrades to an empty board instead of failing startup.
fn load_catalog(config: &AppConfig) -> LoadCatalog {
    match LoadCatalog::from_json_file(&config.catalog.path) {
        Ok(catalog) => {
            info!(
                event_name = "system.bootstrap.catalog_loaded",
                correlation_id = "bootstrap",
                path = %config.catalog.path.display(),
                loads = catalog.len(),
                "load catalog loaded"
            );
            catalog
        }
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.catalog_unavailable",
                correlation_id = "bootstrap",
                error = %error,
                "serving an empty load catalog"
            );
            LoadCatalog::default()
        }
    }
}

fn carrier_registry(config: &AppConfig) -> Result<Arc<dyn CarrierRegistry>, FmcsaError> {
    let registry: Arc<dyn CarrierRegistry> = match config.carrier.provider {
        CarrierProvider::Mock => Arc::new(MockCarrierRegistry::default()),
        CarrierProvider::Fmcsa => Arc::new(FmcsaRegistry::from_config(&config.carrier)?),
    };
    info!(
        event_name = "system.bootstrap.carrier_registry",
        correlation_id = "bootstrap",
        provider = ?config.carrier.provider,
        "carrier registry selected"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use freightdesk_core::config::{ConfigOverrides, LoadOptions};
    use freightdesk_core::SearchCriteria;
    use tempfile::TempDir;

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn options(database_url: &str, api_key: Option<&str>) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                api_key: api_key.map(str::to_string),
                catalog_path: Some("does/not/exist.json".into()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_required_api_key() {
        let result = bootstrap(options("sqlite::memory:", None)).await;

        let error = result.err().expect("bootstrap should fail without an api key");
        assert!(matches!(error, BootstrapError::State(_)));
        assert!(error.to_string().contains("auth.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_wires_store_and_empty_catalog() {
        let app = bootstrap(options("sqlite::memory:", Some("test-key")))
            .await
            .expect("bootstrap should succeed with an api key");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'call_logs'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("call_logs table should exist after bootstrap");
        assert_eq!(table_count, 1);
        assert!(app.state.auth.is_some());
        assert!(app.state.catalog.is_empty());

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_loads_catalog_from_configured_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("loads.json");
        fs::write(
            &path,
            r#"[{"load_id":"LD001","origin":"Chicago, IL","destination":"Atlanta, GA",
                "pickup_datetime":"2025-11-02T09:00:00","delivery_datetime":"2025-11-04T12:00:00",
                "equipment_type":"Reefer","loadboard_rate":1800.0,"weight":38000,
                "commodity_type":"Produce","miles":720}]"#,
        )
        .expect("write catalog");

        let mut load_options = options("sqlite::memory:", Some("test-key"));
        load_options.overrides.catalog_path = Some(path);
        let app = bootstrap(load_options).await.expect("bootstrap");

        assert_eq!(app.state.catalog.len(), 1);
        let results = app
            .state
            .search
            .search(&SearchCriteria::new("Chicago, IL", "Atlanta, GA", "Reefer"), app.state.catalog.loads());
        assert_eq!(results.len(), 1);

        app.db_pool.close().await;
    }
}
