//! ABOUTME: Bounded-concurrency iteration over a context-resolved collection, spec §4.7
//! ABOUTME: Each iteration runs against its own context clone; the parent is written exactly once

use crate::executor::Executor;
use crate::step::{Engine, Step};
use async_trait::async_trait;
use recipe_core::{Context, Recipe, RecipeError, RecipeStep, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

fn default_max_concurrency() -> usize {
    1
}

fn default_fail_fast() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct LoopConfig {
    items: String,
    item_key: String,
    #[serde(default)]
    substeps: Vec<RecipeStep>,
    result_key: String,
    #[serde(default = "default_max_concurrency")]
    max_concurrency: usize,
    #[serde(default)]
    delay: f64,
    #[serde(default = "default_fail_fast")]
    fail_fast: bool,
}

pub struct LoopStep {
    config: LoopConfig,
}

/// Either the 0-based array index or the map key of the element currently
/// being processed. Exposed to the iteration's context as `__index`/`__key`
/// and used to label `LoopItemFailed`/`__errors` entries.
#[derive(Debug, Clone)]
enum ItemKey {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => write!(f, "{k}"),
        }
    }
}

impl LoopStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: LoopConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "loop".to_string(),
                    message: e.to_string(),
                }
            })?;
        for step in &config.substeps {
            if step.step_type.is_empty() {
                return Err(RecipeError::ConfigInvalid {
                    step_type: "loop".to_string(),
                    message: "substep type must not be empty".to_string(),
                });
            }
        }
        Ok(Self { config })
    }
}

/// Resolve the items collection into an ordered, index/key-tagged list, or
/// `LoopItemsInvalid` if the path is absent or not an array/object.
fn resolve_entries(context: &Context, path: &str) -> Result<(bool, Vec<(ItemKey, Value)>)> {
    match context.get_path(path) {
        Some(Value::Array(items)) => Ok((
            false,
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ItemKey::Index(i), v))
                .collect(),
        )),
        Some(Value::Object(map)) => Ok((
            true,
            map.into_iter().map(|(k, v)| (ItemKey::Key(k), v)).collect(),
        )),
        Some(_) => Err(RecipeError::LoopItemsInvalid {
            message: format!("'{path}' did not resolve to an array or object"),
        }),
        None => Err(RecipeError::LoopItemsInvalid {
            message: format!("'{path}' did not resolve to a value"),
        }),
    }
}

#[async_trait]
impl Step for LoopStep {
    async fn execute(&self, context: &mut Context, engine: &Engine) -> Result<()> {
        let (is_map, entries) = resolve_entries(context, &self.config.items)?;

        if entries.is_empty() {
            context.set(
                self.config.result_key.clone(),
                if is_map {
                    Value::Object(Map::new())
                } else {
                    Value::Array(Vec::new())
                },
            );
            return Ok(());
        }

        let substeps_recipe = Arc::new(Recipe {
            steps: self.config.substeps.clone(),
            env_vars: None,
        });
        let semaphore = (self.config.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_concurrency)));

        let mut handles = Vec::with_capacity(entries.len());
        for (launch_index, (key, value)) in entries.iter().cloned().enumerate() {
            if launch_index > 0 && self.config.delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.config.delay)).await;
            }

            let permit = match &semaphore {
                Some(sem) => Some(sem.clone().acquire_owned().await.expect("semaphore never closed")),
                None => None,
            };

            let mut iter_context = context.clone_deep();
            iter_context.set(self.config.item_key.clone(), value);
            match &key {
                ItemKey::Index(i) => iter_context.set("__index", Value::from(*i)),
                ItemKey::Key(k) => iter_context.set("__key", Value::String(k.clone())),
            }

            let recipe = substeps_recipe.clone();
            let engine = engine.clone();
            let item_key = self.config.item_key.clone();
            let key_label = key.to_string();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let nested = Executor::new(engine);
                let outcome = nested.execute(&recipe, &mut iter_context).await;
                outcome.map(|()| iter_context.get_or(&item_key, Value::Null))
            });
            handles.push((launch_index, key_label, handle));
        }

        let mut successes: Vec<(usize, Value)> = Vec::new();
        let mut failures: Vec<(usize, String, RecipeError)> = Vec::new();
        for (launch_index, key_label, handle) in handles {
            let outcome = handle.await.expect("loop iteration task panicked");
            match outcome {
                Ok(value) => successes.push((launch_index, value)),
                Err(cause) => failures.push((launch_index, key_label, cause)),
            }
        }

        if self.config.fail_fast {
            if !failures.is_empty() {
                let min_index = failures.iter().map(|(i, _, _)| *i).min().unwrap();
                let (_, key_label, cause) = failures
                    .into_iter()
                    .find(|(i, _, _)| *i == min_index)
                    .unwrap();
                debug!(key = %key_label, "loop iteration failed, fail_fast aborts aggregate");
                return Err(RecipeError::loop_item_failed(key_label, cause));
            }
            let aggregate = build_success_aggregate(is_map, &entries, &successes);
            context.set(self.config.result_key.clone(), aggregate);
            return Ok(());
        }

        let messages: Vec<(usize, String, String)> = failures
            .iter()
            .map(|(i, k, e)| (*i, k.clone(), e.to_string()))
            .collect();
        let (aggregate, errors) = build_partial_aggregate(is_map, &entries, &successes, &messages);
        context.set(self.config.result_key.clone(), aggregate);
        if let Some(errors) = errors {
            context.set(format!("{}__errors", self.config.result_key), errors);
        }
        Ok(())
    }
}

fn build_success_aggregate(
    is_map: bool,
    entries: &[(ItemKey, Value)],
    successes: &[(usize, Value)],
) -> Value {
    if is_map {
        let mut map = Map::new();
        for (index, value) in successes {
            if let ItemKey::Key(k) = &entries[*index].0 {
                map.insert(k.clone(), value.clone());
            }
        }
        Value::Object(map)
    } else {
        let mut ordered: Vec<Option<Value>> = vec![None; entries.len()];
        for (index, value) in successes {
            ordered[*index] = Some(value.clone());
        }
        Value::Array(ordered.into_iter().map(|v| v.unwrap_or(Value::Null)).collect())
    }
}

/// Build the `fail_fast = false` aggregate in the same shape
/// `build_success_aggregate` would have produced had every item succeeded,
/// with failed slots left as `null` (array case) or simply absent (map case)
/// rather than compacted away, so `result_key[i]` keeps corresponding to
/// input element `i` regardless of which items failed.
///
/// For a map collection the result is itself an object, so `__errors` is
/// embedded as a sub-key of it directly. A JSON array has no key of its own
/// to carry one, so for an array collection the errors are returned
/// separately for the caller to store as a sibling context key instead.
fn build_partial_aggregate(
    is_map: bool,
    entries: &[(ItemKey, Value)],
    successes: &[(usize, Value)],
    failures: &[(usize, String, String)],
) -> (Value, Option<Value>) {
    let aggregate = build_success_aggregate(is_map, entries, successes);

    if failures.is_empty() {
        return (aggregate, None);
    }

    let mut errors = Map::new();
    for (_, key_label, message) in failures {
        errors.insert(key_label.clone(), Value::String(message.clone()));
    }

    if is_map {
        let Value::Object(mut map) = aggregate else {
            unreachable!("build_success_aggregate(is_map = true, ..) always returns an object")
        };
        map.insert("__errors".to_string(), Value::Object(errors));
        (Value::Object(map), None)
    } else {
        (aggregate, Some(Value::Object(errors)))
    }
}
