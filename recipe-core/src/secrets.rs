//! ABOUTME: Recursive masking of secret-shaped values before they reach debug logs
//! ABOUTME: A key is secret if its lowercased name contains key/token/secret/auth/password

use serde_json::{Map, Value};

const SECRET_MARKERS: &[&str] = &["key", "token", "secret", "auth", "password"];

/// Whether `key`'s lowercased name matches a secret marker.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SECRET_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Mask a string to single-character-at-ends-only form: `"sk-abcdef"` ->
/// `"s*******f"`. Strings of length <= 2 are fully masked.
#[must_use]
pub fn mask_string(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 2 {
        return "*".repeat(chars.len());
    }
    let first = chars[0];
    let last = chars[chars.len() - 1];
    format!("{first}{}{last}", "*".repeat(chars.len() - 2))
}

/// Recursively walk `value`, masking any object field whose key is secret.
#[must_use]
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut masked = Map::with_capacity(map.len());
            for (k, v) in map {
                if is_secret_key(k) {
                    masked.insert(k.clone(), mask_leaf(v));
                } else {
                    masked.insert(k.clone(), mask_value(v));
                }
            }
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(items.iter().map(mask_value).collect()),
        other => other.clone(),
    }
}

fn mask_leaf(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_string(s)),
        Value::Object(_) | Value::Array(_) => mask_value(value),
        other => other.clone(),
    }
}
