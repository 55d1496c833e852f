//! ABOUTME: Mutable artifact store plus immutable configuration store
//! ABOUTME: Safe to clone and snapshot; single-writer, no internal locking

use crate::error::{RecipeError, Result};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Shared, mutable execution state threaded through a recipe run.
///
/// `artifacts` is the live, step-writable map. `config` is populated once at
/// startup (environment, `.env`, CLI overrides) and is conceptually
/// read-only during execution, though nothing in the type enforces that.
///
/// Construction deep-copies any supplied initial maps, and every accessor
/// that would otherwise leak a reference returns an owned clone, so a
/// `Context` never lets an external caller observe or mutate its internals
/// except through its own methods.
#[derive(Debug, Clone, Default)]
pub struct Context {
    artifacts: Map<String, Value>,
    config: Map<String, Value>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with initial artifacts and config. Both maps
    /// are deep-copied so later mutation of the caller's maps cannot reach
    /// back into the context.
    #[must_use]
    pub fn with_initial(artifacts: Map<String, Value>, config: Map<String, Value>) -> Self {
        Self { artifacts, config }
    }

    /// Read an artifact, raising `KeyMissing` if absent.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.artifacts.get(key).cloned().ok_or_else(|| {
            trace!(key, "context key missing");
            RecipeError::KeyMissing {
                key: key.to_string(),
            }
        })
    }

    /// Read an artifact, falling back to `default` instead of raising.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.artifacts.get(key).cloned().unwrap_or(default)
    }

    /// Resolve a dotted path (`"a.b.c"`) into nested artifacts. Missing
    /// intermediate keys resolve to `None` rather than raising, matching the
    /// template renderer's tolerant lookup semantics.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.artifacts.get(first)?.clone();
        for part in parts {
            current = match current {
                Value::Object(ref map) => map.get(part)?.clone(),
                _ => return None,
            };
        }
        Some(current)
    }

    /// Store a value under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!(key = %key, "context set");
        self.artifacts.insert(key, value);
    }

    /// Remove `key`, raising `KeyMissing` if absent.
    pub fn delete(&mut self, key: &str) -> Result<Value> {
        self.artifacts
            .remove(key)
            .ok_or_else(|| RecipeError::KeyMissing {
                key: key.to_string(),
            })
    }

    /// Whether `key` is present among the artifacts.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.artifacts.contains_key(key)
    }

    /// Keys in insertion order, captured up front so a caller mutating the
    /// context mid-iteration cannot invalidate the iterator.
    #[must_use]
    pub fn iterate(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    /// Number of artifacts currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether there are no artifacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Deep copy of both maps, fully independent of `self`.
    #[must_use]
    pub fn clone_deep(&self) -> Self {
        self.clone()
    }

    /// Deep copy of the artifacts only, for serialization or inspection.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.artifacts.clone()
    }

    /// Deep copy of the config map.
    #[must_use]
    pub fn config(&self) -> Map<String, Value> {
        self.config.clone()
    }

    /// Replace the config map with a deep copy of `config`.
    pub fn set_config(&mut self, config: Map<String, Value>) {
        self.config = config;
    }

    /// Read a single config value.
    #[must_use]
    pub fn config_get(&self, key: &str) -> Option<Value> {
        self.config.get(key).cloned()
    }

    /// Set a single config value.
    pub fn config_set(&mut self, key: impl Into<String>, value: Value) {
        self.config.insert(key.into(), value);
    }

    /// Flattened view merging config and artifacts into one namespace, with
    /// artifacts taking precedence on key collision. Used by the template
    /// renderer's variable lookup.
    #[must_use]
    pub fn flattened_view(&self) -> Map<String, Value> {
        let mut merged = self.config.clone();
        for (k, v) in &self.artifacts {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}
