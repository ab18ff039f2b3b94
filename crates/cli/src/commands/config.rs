use std::env;
use std::fs;
use std::path::Path;

use freightdesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = config_file_path.as_deref().and_then(load_config_file_doc);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn field(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    Field { key, value, env_keys }
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    vec![
        field("database.url", config.database.url.clone(), &["FREIGHTDESK_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FREIGHTDESK_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FREIGHTDESK_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["FREIGHTDESK_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["FREIGHTDESK_SERVER_PORT", "PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["FREIGHTDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "auth.api_key",
            redact_secret(config.auth.api_key.as_ref()),
            &["FREIGHTDESK_AUTH_API_KEY", "API_KEY"],
        ),
        field("auth.required", config.auth.required.to_string(), &["FREIGHTDESK_AUTH_REQUIRED"]),
        field(
            "catalog.path",
            config.catalog.path.display().to_string(),
            &["FREIGHTDESK_CATALOG_PATH"],
        ),
        field(
            "matching.min_score",
            config.matching.min_score.to_string(),
            &["FREIGHTDESK_MATCHING_MIN_SCORE"],
        ),
        field(
            "matching.default_limit",
            config.matching.default_limit.to_string(),
            &["FREIGHTDESK_MATCHING_DEFAULT_LIMIT"],
        ),
        field(
            "negotiation.floor_pct",
            config.negotiation.floor_pct.to_string(),
            &["FREIGHTDESK_NEGOTIATION_FLOOR_PCT"],
        ),
        field(
            "negotiation.ceiling_pct",
            config.negotiation.ceiling_pct.to_string(),
            &["FREIGHTDESK_NEGOTIATION_CEILING_PCT"],
        ),
        field(
            "negotiation.max_rounds",
            config.negotiation.max_rounds.to_string(),
            &["FREIGHTDESK_NEGOTIATION_MAX_ROUNDS"],
        ),
        field(
            "carrier.provider",
            format!("{:?}", config.carrier.provider),
            &["FREIGHTDESK_CARRIER_PROVIDER"],
        ),
        field(
            "carrier.api_key",
            redact_secret(config.carrier.api_key.as_ref()),
            &["FREIGHTDESK_CARRIER_API_KEY", "FMCSA_API_KEY"],
        ),
        field(
            "carrier.base_url",
            config.carrier.base_url.clone(),
            &["FREIGHTDESK_CARRIER_BASE_URL", "FMCSA_API_URL"],
        ),
        field(
            "carrier.max_retries",
            config.carrier.max_retries.to_string(),
            &["FREIGHTDESK_CARRIER_MAX_RETRIES"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["FREIGHTDESK_LOGGING_LEVEL", "FREIGHTDESK_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["FREIGHTDESK_LOGGING_FORMAT", "FREIGHTDESK_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Shows at most the last four characters of a key.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };

    let trimmed = secret.expose_secret().trim();
    match trimmed.chars().count() {
        0 => "<empty>".to_string(),
        count if count <= 8 => "<redacted>".to_string(),
        count => {
            let tail: String = trimmed.chars().skip(count - 4).collect();
            format!("***{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_are_never_rendered_in_full() {
        assert_eq!(redact_secret(None), "<unset>");
        assert_eq!(redact_secret(Some(&SecretString::from(" ".to_string()))), "<empty>");
        assert_eq!(redact_secret(Some(&SecretString::from("short".to_string()))), "<redacted>");
        assert_eq!(
            redact_secret(Some(&SecretString::from("fd-live-0123456789".to_string()))),
            "***6789"
        );
    }

    #[test]
    fn nested_keys_are_found_in_config_document() {
        let doc: Value = "[carrier]\nprovider = \"fmcsa\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "carrier.provider"));
        assert!(!contains_path(&doc, "carrier.api_key"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
