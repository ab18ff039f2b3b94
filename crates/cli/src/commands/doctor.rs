use freightdesk_core::config::{AppConfig, CarrierProvider, LoadOptions};
use freightdesk_core::LoadCatalog;
use freightdesk_db::{connect_with_settings, ping};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_OPERATION};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Exit code is non-zero when any check fails, so the command can gate deployments.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_OPERATION };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_api_auth(&config));
            checks.push(check_catalog(&config));
            checks.push(check_carrier_provider(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.extend(
                ["api_auth", "load_catalog", "carrier_provider", "database_connectivity"]
                    .into_iter()
                    .map(DoctorCheck::skipped),
            );
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_api_auth(config: &AppConfig) -> DoctorCheck {
    match (config.auth.required, config.auth.expected_key().is_some()) {
        (true, true) => DoctorCheck::pass("api_auth", "api key configured"),
        (true, false) => DoctorCheck::fail(
            "api_auth",
            "auth.required is true but no api key is set (FREIGHTDESK_AUTH_API_KEY)",
        ),
        (false, _) => DoctorCheck::pass("api_auth", "authentication disabled"),
    }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let path = &config.catalog.path;
    if !path.exists() {
        return DoctorCheck::pass(
            "load_catalog",
            format!("`{}` not found; the server will start with an empty board", path.display()),
        );
    }

    match LoadCatalog::from_json_file(path) {
        Ok(catalog) => DoctorCheck::pass(
            "load_catalog",
            format!("{} loads available from `{}`", catalog.len(), path.display()),
        ),
        Err(error) => DoctorCheck::fail("load_catalog", error.to_string()),
    }
}

fn check_carrier_provider(config: &AppConfig) -> DoctorCheck {
    match config.carrier.provider {
        CarrierProvider::Mock => {
            DoctorCheck::pass("carrier_provider", "mock registry (every valid MC number is eligible)")
        }
        CarrierProvider::Fmcsa => DoctorCheck::pass(
            "carrier_provider",
            format!("FMCSA registry at `{}`", config.carrier.base_url),
        ),
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        let probe =
            ping(&pool).await.map_err(|error| format!("database did not answer: {error}"));
        pool.close().await;
        probe
    });

    match result {
        Ok(()) => DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        ),
        Err(error) => DoctorCheck::fail("database_connectivity", error),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
