//! ABOUTME: Environment, .env, and CLI-override layering for the recipe executor
//! ABOUTME: Priority: CLI `--config` overrides > recipe `env_vars` pulled from the process environment

use recipe_core::secrets::mask_value;
use serde_json::{Map, Value};
use tracing::debug;

/// Load a `.env` file from the working directory into the process
/// environment, if present. A no-op (not an error) when no `.env` file
/// exists; per spec this must run before any `env_vars` lookups.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(dotenv::Error::Io(_)) => {}
        Err(e) => debug!(error = %e, "failed to parse .env file"),
    }
}

/// Pull the recipe's declared `env_vars` from the process environment,
/// lower-casing each name into the configuration key.
#[must_use]
pub fn env_vars_config(names: &[String]) -> Map<String, Value> {
    let mut config = Map::new();
    for name in names {
        if let Ok(value) = std::env::var(name) {
            config.insert(name.to_lowercase(), Value::String(value));
        }
    }
    config
}

/// Parse a single `key=value` CLI argument. The value is attempted as JSON
/// first (so `--config max_tokens=100` yields a number) and falls back to a
/// plain string otherwise.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("expected key=value, got '{raw}'"));
    }
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

/// Layer configuration sources: recipe `env_vars` (lowest), then CLI
/// `--config` overrides (highest, per spec §6 "take precedence over
/// environment"). Logs the assembled map at debug level with secrets masked.
#[must_use]
pub fn build_config(env_vars: Map<String, Value>, cli_overrides: &[(String, Value)]) -> Map<String, Value> {
    let mut config = env_vars;
    for (key, value) in cli_overrides {
        config.insert(key.clone(), value.clone());
    }
    debug!(config = %mask_value(&Value::Object(config.clone())), "assembled configuration");
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn parses_string_value() {
        let (k, v) = parse_key_value("name=alice").unwrap();
        assert_eq!(k, "name");
        assert_eq!(v, json!("alice"));
    }

    #[test]
    fn parses_numeric_value() {
        let (k, v) = parse_key_value("max_tokens=100").unwrap();
        assert_eq!(k, "max_tokens");
        assert_eq!(v, json!(100));
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(parse_key_value("no-equals-sign").is_err());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    #[serial]
    fn env_vars_config_lower_cases_keys() {
        std::env::set_var("RECIPE_TEST_KEY", "secret-value");
        let config = env_vars_config(&["RECIPE_TEST_KEY".to_string()]);
        assert_eq!(
            config.get("recipe_test_key"),
            Some(&json!("secret-value"))
        );
        std::env::remove_var("RECIPE_TEST_KEY");
    }

    #[test]
    fn env_vars_config_skips_absent_vars() {
        let config = env_vars_config(&["RECIPE_TEST_ABSENT_VAR".to_string()]);
        assert!(config.is_empty());
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let mut env_vars = Map::new();
        env_vars.insert("model".to_string(), json!("from-env"));
        let overrides = vec![("model".to_string(), json!("from-cli"))];
        let config = build_config(env_vars, &overrides);
        assert_eq!(config.get("model"), Some(&json!("from-cli")));
    }
}
