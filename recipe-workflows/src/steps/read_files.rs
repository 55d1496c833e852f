//! ABOUTME: UTF-8 file ingestion into the context, one of the leaf steps of spec §4.10
//! ABOUTME: `path` may render to a single path, a comma-separated list, or a JSON array

use crate::step::{Engine, Step};
use async_trait::async_trait;
use recipe_core::{Context, RecipeError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

fn default_merge_mode() -> String {
    "concat".to_string()
}

#[derive(Debug, Deserialize)]
struct ReadFilesConfig {
    path: Value,
    content_key: String,
    #[serde(default = "default_merge_mode")]
    merge_mode: String,
    #[serde(default)]
    optional: bool,
}

pub struct ReadFilesStep {
    config: ReadFilesConfig,
}

impl ReadFilesStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: ReadFilesConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "read_files".to_string(),
                    message: e.to_string(),
                }
            })?;
        if config.merge_mode != "concat" && config.merge_mode != "dict" {
            return Err(RecipeError::ConfigInvalid {
                step_type: "read_files".to_string(),
                message: format!("unknown merge_mode '{}'", config.merge_mode),
            });
        }
        Ok(Self { config })
    }
}

/// Split a rendered `path` field into one or more individual paths: a JSON
/// array of strings, or a single string optionally comma-separated.
fn rendered_paths(path_template: &Value, context: &Context) -> Result<Vec<String>> {
    match path_template {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let raw = item.as_str().ok_or_else(|| RecipeError::ConfigInvalid {
                    step_type: "read_files".to_string(),
                    message: "path array entries must be strings".to_string(),
                })?;
                recipe_templates::render(raw, context)
            })
            .collect(),
        Value::String(raw) => {
            let rendered = recipe_templates::render(raw, context)?;
            Ok(rendered
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect())
        }
        _ => Err(RecipeError::ConfigInvalid {
            step_type: "read_files".to_string(),
            message: "path must be a string or an array of strings".to_string(),
        }),
    }
}

fn read_one(path: &str, optional: bool) -> Result<String> {
    match std::fs::read_to_string(Path::new(path)) {
        Ok(content) => Ok(content),
        Err(_) if optional => Ok(String::new()),
        Err(_) => Err(RecipeError::FileMissing {
            path: path.to_string(),
        }),
    }
}

#[async_trait]
impl Step for ReadFilesStep {
    async fn execute(&self, context: &mut Context, _engine: &Engine) -> Result<()> {
        let paths = rendered_paths(&self.config.path, context)?;
        let mut contents = Vec::with_capacity(paths.len());
        for path in &paths {
            contents.push(read_one(path, self.config.optional)?);
        }

        let merged = if self.config.merge_mode == "dict" {
            let mut map = Map::new();
            for (path, content) in paths.iter().zip(contents.into_iter()) {
                let name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.clone());
                map.insert(name, Value::String(content));
            }
            Value::Object(map)
        } else {
            Value::String(contents.join("\n"))
        };

        context.set(self.config.content_key.clone(), merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn engine() -> Engine {
        Engine {
            registry: std::sync::Arc::new(crate::registry::StepRegistry::new()),
            provider: std::sync::Arc::new(recipe_providers::EchoProvider),
        }
    }

    #[tokio::test]
    async fn reads_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "hello").unwrap();
        let config = Map::from_iter([
            ("path".into(), json!(file.path().to_string_lossy().to_string())),
            ("content_key".into(), json!("out")),
        ]);
        let step = ReadFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        step.execute(&mut context, &engine()).await.unwrap();
        assert_eq!(context.get("out").unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn missing_required_file_fails() {
        let config = Map::from_iter([
            ("path".into(), json!("/definitely/not/here.txt")),
            ("content_key".into(), json!("out")),
        ]);
        let step = ReadFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        let err = step.execute(&mut context, &engine()).await.unwrap_err();
        assert!(matches!(err, RecipeError::FileMissing { .. }));
    }

    #[tokio::test]
    async fn missing_optional_file_stores_empty_string() {
        let config = Map::from_iter([
            ("path".into(), json!("/definitely/not/here.txt")),
            ("content_key".into(), json!("out")),
            ("optional".into(), json!(true)),
        ]);
        let step = ReadFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        step.execute(&mut context, &engine()).await.unwrap();
        assert_eq!(context.get("out").unwrap(), json!(""));
    }

    #[tokio::test]
    async fn concat_joins_with_newline() {
        let mut a = NamedTempFile::new().unwrap();
        write!(a, "one").unwrap();
        let mut b = NamedTempFile::new().unwrap();
        write!(b, "two").unwrap();
        let config = Map::from_iter([
            (
                "path".into(),
                json!(format!(
                    "{},{}",
                    a.path().to_string_lossy(),
                    b.path().to_string_lossy()
                )),
            ),
            ("content_key".into(), json!("out")),
        ]);
        let step = ReadFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        step.execute(&mut context, &engine()).await.unwrap();
        assert_eq!(context.get("out").unwrap(), json!("one\ntwo"));
    }

    #[tokio::test]
    async fn dict_mode_keys_by_filename() {
        let mut a = NamedTempFile::new().unwrap();
        write!(a, "one").unwrap();
        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        let config = Map::from_iter([
            ("path".into(), json!(a.path().to_string_lossy().to_string())),
            ("content_key".into(), json!("out")),
            ("merge_mode".into(), json!("dict")),
        ]);
        let step = ReadFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        step.execute(&mut context, &engine()).await.unwrap();
        assert_eq!(context.get("out").unwrap()[name], json!("one"));
    }

    #[test]
    fn rejects_unknown_merge_mode() {
        let config = Map::from_iter([
            ("path".into(), json!("a.txt")),
            ("content_key".into(), json!("out")),
            ("merge_mode".into(), json!("zip")),
        ]);
        assert!(ReadFilesStep::from_config(&config).is_err());
    }
}
