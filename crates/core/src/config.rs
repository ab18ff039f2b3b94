use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::matching::{MatchWeights, DEFAULT_MIN_SCORE, DEFAULT_WEIGHTS};
use crate::negotiation::{
    Guardrails, NegotiationPolicy, DEFAULT_CEILING_PCT, DEFAULT_FLOOR_PCT, DEFAULT_MAX_ROUNDS,
};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["freightdesk.toml", "config/freightdesk.toml"];
pub const DEFAULT_FMCSA_BASE_URL: &str = "https://mobile.fmcsa.dot.gov/qc/services/carriers";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub negotiation: NegotiationConfig,
    pub carrier: CarrierConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub api_key: Option<SecretString>,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub weights: MatchWeights,
    pub min_score: f64,
    pub default_limit: usize,
}

#[derive(Clone, Debug)]
pub struct NegotiationConfig {
    pub floor_pct: f64,
    pub ceiling_pct: f64,
    pub max_rounds: i64,
}

#[derive(Clone, Debug)]
pub struct CarrierConfig {
    pub provider: CarrierProvider,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierProvider {
    Mock,
    Fmcsa,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub carrier_provider: Option<CarrierProvider>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://freightdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            auth: AuthConfig { api_key: None, required: true },
            catalog: CatalogConfig { path: PathBuf::from("data/loads.json") },
            matching: MatchingConfig {
                weights: DEFAULT_WEIGHTS,
                min_score: DEFAULT_MIN_SCORE,
                default_limit: 3,
            },
            negotiation: NegotiationConfig {
                floor_pct: DEFAULT_FLOOR_PCT,
                ceiling_pct: DEFAULT_CEILING_PCT,
                max_rounds: DEFAULT_MAX_ROUNDS,
            },
            carrier: CarrierConfig {
                provider: CarrierProvider::Mock,
                api_key: None,
                base_url: DEFAULT_FMCSA_BASE_URL.to_string(),
                timeout_secs: 10,
                max_retries: 3,
                retry_delay_ms: 1_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CarrierProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "fmcsa" => Ok(Self::Fmcsa),
            other => Err(ConfigError::Validation(format!(
                "unsupported carrier provider `{other}` (expected mock|fmcsa)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl NegotiationConfig {
    pub fn guardrails(&self) -> Result<Guardrails, DomainError> {
        Guardrails::new(self.floor_pct, self.ceiling_pct)
    }

    pub fn policy(&self) -> NegotiationPolicy {
        NegotiationPolicy::new(self.max_rounds)
    }
}

impl AuthConfig {
    /// The configured key, ignoring blank values.
    pub fn expected_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(api_key) = auth.api_key {
                self.auth.api_key = Some(secret_value(api_key));
            }
            if let Some(required) = auth.required {
                self.auth.required = required;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(weights) = matching.weights {
                if let Some(origin) = weights.origin {
                    self.matching.weights.origin = origin;
                }
                if let Some(destination) = weights.destination {
                    self.matching.weights.destination = destination;
                }
                if let Some(equipment) = weights.equipment {
                    self.matching.weights.equipment = equipment;
                }
                if let Some(date) = weights.date {
                    self.matching.weights.date = date;
                }
            }
            if let Some(min_score) = matching.min_score {
                self.matching.min_score = min_score;
            }
            if let Some(default_limit) = matching.default_limit {
                self.matching.default_limit = default_limit;
            }
        }

        if let Some(negotiation) = patch.negotiation {
            if let Some(floor_pct) = negotiation.floor_pct {
                self.negotiation.floor_pct = floor_pct;
            }
            if let Some(ceiling_pct) = negotiation.ceiling_pct {
                self.negotiation.ceiling_pct = ceiling_pct;
            }
            if let Some(max_rounds) = negotiation.max_rounds {
                self.negotiation.max_rounds = max_rounds;
            }
        }

        if let Some(carrier) = patch.carrier {
            if let Some(provider) = carrier.provider {
                self.carrier.provider = provider;
            }
            if let Some(api_key) = carrier.api_key {
                self.carrier.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = carrier.base_url {
                self.carrier.base_url = base_url;
            }
            if let Some(timeout_secs) = carrier.timeout_secs {
                self.carrier.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = carrier.max_retries {
                self.carrier.max_retries = max_retries;
            }
            if let Some(retry_delay_ms) = carrier.retry_delay_ms {
                self.carrier.retry_delay_ms = retry_delay_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FREIGHTDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FREIGHTDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("FREIGHTDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("FREIGHTDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FREIGHTDESK_SERVER_PORT").or_else(|| read_env("PORT")) {
            self.server.port = parse_env("FREIGHTDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("FREIGHTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_AUTH_API_KEY").or_else(|| read_env("API_KEY")) {
            self.auth.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FREIGHTDESK_AUTH_REQUIRED") {
            self.auth.required = parse_env("FREIGHTDESK_AUTH_REQUIRED", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("FREIGHTDESK_MATCHING_MIN_SCORE") {
            self.matching.min_score = parse_env("FREIGHTDESK_MATCHING_MIN_SCORE", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_MATCHING_DEFAULT_LIMIT") {
            self.matching.default_limit = parse_env("FREIGHTDESK_MATCHING_DEFAULT_LIMIT", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_NEGOTIATION_FLOOR_PCT") {
            self.negotiation.floor_pct = parse_env("FREIGHTDESK_NEGOTIATION_FLOOR_PCT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_NEGOTIATION_CEILING_PCT") {
            self.negotiation.ceiling_pct =
                parse_env("FREIGHTDESK_NEGOTIATION_CEILING_PCT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_NEGOTIATION_MAX_ROUNDS") {
            self.negotiation.max_rounds = parse_env("FREIGHTDESK_NEGOTIATION_MAX_ROUNDS", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_CARRIER_PROVIDER") {
            self.carrier.provider = value.parse()?;
        }
        if let Some(value) =
            read_env("FREIGHTDESK_CARRIER_API_KEY").or_else(|| read_env("FMCSA_API_KEY"))
        {
            self.carrier.api_key = Some(secret_value(value));
        }
        if let Some(value) =
            read_env("FREIGHTDESK_CARRIER_BASE_URL").or_else(|| read_env("FMCSA_API_URL"))
        {
            self.carrier.base_url = value;
        }
        if let Some(value) = read_env("FREIGHTDESK_CARRIER_TIMEOUT_SECS") {
            self.carrier.timeout_secs = parse_env("FREIGHTDESK_CARRIER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_CARRIER_MAX_RETRIES") {
            self.carrier.max_retries = parse_env("FREIGHTDESK_CARRIER_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_CARRIER_RETRY_DELAY_MS") {
            self.carrier.retry_delay_ms = parse_env("FREIGHTDESK_CARRIER_RETRY_DELAY_MS", &value)?;
        }

        let log_level =
            read_env("FREIGHTDESK_LOGGING_LEVEL").or_else(|| read_env("FREIGHTDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FREIGHTDESK_LOGGING_FORMAT").or_else(|| read_env("FREIGHTDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(api_key) = overrides.api_key {
            self.auth.api_key = Some(secret_value(api_key));
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(carrier_provider) = overrides.carrier_provider {
            self.carrier.provider = carrier_provider;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_matching(&self.matching)?;
        validate_negotiation(&self.negotiation)?;
        validate_carrier(&self.carrier)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Explicit path if it exists, otherwise the first default location present on disk.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    matching
        .weights
        .validate()
        .map_err(|error| ConfigError::Validation(format!("matching.weights: {error}")))?;

    if !(0.0..=1.0).contains(&matching.min_score) {
        return Err(ConfigError::Validation(
            "matching.min_score must be in range 0.0..=1.0".to_string(),
        ));
    }

    if matching.default_limit == 0 {
        return Err(ConfigError::Validation(
            "matching.default_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_negotiation(negotiation: &NegotiationConfig) -> Result<(), ConfigError> {
    negotiation
        .guardrails()
        .map_err(|error| ConfigError::Validation(format!("negotiation guardrails: {error}")))?;

    if negotiation.max_rounds < 1 {
        return Err(ConfigError::Validation(
            "negotiation.max_rounds must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_carrier(carrier: &CarrierConfig) -> Result<(), ConfigError> {
    if carrier.timeout_secs == 0 || carrier.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "carrier.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if carrier.max_retries == 0 {
        return Err(ConfigError::Validation(
            "carrier.max_retries must be greater than zero".to_string(),
        ));
    }

    if carrier.provider == CarrierProvider::Fmcsa {
        let missing = carrier
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "carrier.api_key is required for the fmcsa provider. Register a web key at https://mobile.fmcsa.dot.gov/QCDevsite/".to_string(),
            ));
        }

        if !carrier.base_url.starts_with("http://") && !carrier.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "carrier.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    catalog: Option<CatalogPatch>,
    matching: Option<MatchingPatch>,
    negotiation: Option<NegotiationPatch>,
    carrier: Option<CarrierPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    api_key: Option<String>,
    required: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    weights: Option<WeightsPatch>,
    min_score: Option<f64>,
    default_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    origin: Option<f64>,
    destination: Option<f64>,
    equipment: Option<f64>,
    date: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationPatch {
    floor_pct: Option<f64>,
    ceiling_pct: Option<f64>,
    max_rounds: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct CarrierPatch {
    provider: Option<CarrierProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, CarrierProvider, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_documented_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.server.port == 8000, "default port should be 8000")?;
        ensure(config.catalog.path == PathBuf::from("data/loads.json"), "default catalog path")?;
        ensure(config.matching.default_limit == 3, "default result limit should be 3")?;
        ensure(config.negotiation.max_rounds == 3, "default max rounds should be 3")?;
        ensure(config.carrier.provider == CarrierProvider::Mock, "default provider is mock")?;
        ensure(config.auth.required, "auth should be required by default")?;
        ensure(config.auth.expected_key().is_none(), "no api key by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_FREIGHTDESK_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("freightdesk.toml");
            fs::write(
                &path,
                r#"
[auth]
api_key = "${TEST_FREIGHTDESK_KEY}"

[matching.weights]
equipment = 0.2
date = 0.2
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.auth.expected_key() == Some("key-from-env"),
                "api key should be interpolated from environment",
            )?;
            ensure(config.matching.weights.date == 0.2, "date weight should come from file")?;
            ensure(
                config.matching.weights.equipment == 0.2,
                "equipment weight should come from file",
            )?;
            ensure(config.matching.weights.origin == 0.3, "origin weight keeps its default")?;
            Ok(())
        })();

        clear_vars(&["TEST_FREIGHTDESK_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("freightdesk.toml");
        fs::write(&path, "[auth]\napi_key = \"${FREIGHTDESK_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "FREIGHTDESK_TEST_UNSET_VAR"),
            "missing variable should be named",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_LOG_LEVEL", "warn");
        env::set_var("FREIGHTDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["FREIGHTDESK_LOG_LEVEL", "FREIGHTDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("FREIGHTDESK_NEGOTIATION_FLOOR_PCT", "0.15");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("freightdesk.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[negotiation]
floor_pct = 0.2
max_rounds = 5

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.negotiation.floor_pct == 0.15, "env floor should win over file")?;
            ensure(config.negotiation.max_rounds == 5, "file max rounds should win over default")?;
            Ok(())
        })();

        clear_vars(&["FREIGHTDESK_DATABASE_URL", "FREIGHTDESK_NEGOTIATION_FLOOR_PCT"]);
        result
    }

    #[test]
    fn fmcsa_provider_requires_api_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_CARRIER_PROVIDER", "fmcsa");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("carrier.api_key")
            );
            ensure(has_message, "validation failure should mention carrier.api_key")
        })();

        clear_vars(&["FREIGHTDESK_CARRIER_PROVIDER"]);
        result
    }

    #[test]
    fn invalid_guardrails_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_NEGOTIATION_FLOOR_PCT", "1.5");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("floor_pct")),
                "validation failure should mention floor_pct",
            )
        })();

        clear_vars(&["FREIGHTDESK_NEGOTIATION_FLOOR_PCT"]);
        result
    }

    #[test]
    fn match_weights_must_sum_to_one() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.matching.weights.origin = 1.0;
        config.matching.weights.destination = 1.0;
        config.matching.weights.equipment = 1.0;
        config.matching.weights.date = 1.0;

        let error = match config.validate() {
            Ok(()) => return Err("weights summing to 4.0 should fail validation".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("sum to 1.0")),
            "validation failure should mention the weight sum",
        )?;

        config.matching.weights.origin = 0.4;
        config.matching.weights.destination = 0.4;
        config.matching.weights.equipment = 0.1;
        config.matching.weights.date = 0.1;
        config.validate().map_err(|error| format!("rebalanced weights should pass: {error}"))
    }

    #[test]
    fn unparseable_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_SERVER_PORT", "eighty");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "FREIGHTDESK_SERVER_PORT"),
                "invalid override should name the variable",
            )
        })();

        clear_vars(&["FREIGHTDESK_SERVER_PORT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_AUTH_API_KEY", "api-secret-value");
        env::set_var("FREIGHTDESK_CARRIER_API_KEY", "fmcsa-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("api-secret-value"), "debug output should not contain api key")?;
            ensure(
                !debug.contains("fmcsa-secret-value"),
                "debug output should not contain carrier key",
            )?;
            ensure(
                config.carrier.api_key.as_ref().map(|key| key.expose_secret().to_string())
                    == Some("fmcsa-secret-value".to_string()),
                "carrier key should be loaded",
            )?;
            Ok(())
        })();

        clear_vars(&["FREIGHTDESK_AUTH_API_KEY", "FREIGHTDESK_CARRIER_API_KEY"]);
        result
    }
}
