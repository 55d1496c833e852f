//! ABOUTME: Writes a FileSpec list from the context to disk, the other leaf step of spec §4.10
//! ABOUTME: Every resolved path is normalized and checked against `root` before any write happens

use crate::step::{Engine, Step};
use async_trait::async_trait;
use path_clean::PathClean;
use recipe_core::{Context, FileContent, FileSpec, RecipeError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

fn default_root() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct WriteFilesConfig {
    files_key: String,
    #[serde(default = "default_root")]
    root: String,
}

pub struct WriteFilesStep {
    config: WriteFilesConfig,
}

impl WriteFilesStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: WriteFilesConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "write_files".to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self { config })
    }
}

fn content_to_string(content: &FileContent) -> Result<String> {
    Ok(match content {
        FileContent::Text(s) => s.clone(),
        FileContent::Structured(v) => serde_json::to_string_pretty(v)?,
        FileContent::List(items) => serde_json::to_string_pretty(items)?,
    })
}

/// Join `path` under `root` and clean the result, rejecting any path that
/// still escapes `root` after normalization (`../` sequences, absolute
/// overrides). `root` is resolved against the current directory first so a
/// relative root (the default is `.`) still contains its normalized children
/// under the containment check, rather than comparing an absolute joined
/// path against a bare relative one.
fn resolve_under_root(root: &Path, path: &str) -> Result<PathBuf> {
    let root_abs = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    }
    .clean();
    let joined = root_abs.join(path).clean();
    if !joined.starts_with(&root_abs) {
        return Err(RecipeError::RecipeInvalid {
            message: format!("write path '{path}' escapes root '{}'", root.display()),
        });
    }
    Ok(joined)
}

#[async_trait]
impl Step for WriteFilesStep {
    async fn execute(&self, context: &mut Context, _engine: &Engine) -> Result<()> {
        let root_rendered = recipe_templates::render(&self.config.root, context)?;
        let root = Path::new(&root_rendered).to_path_buf();

        let files_value = context.get(&self.config.files_key)?;
        let specs: Vec<FileSpec> =
            serde_json::from_value(files_value).map_err(|e| RecipeError::ConfigInvalid {
                step_type: "write_files".to_string(),
                message: format!("'{}' is not a FileSpec list: {e}", self.config.files_key),
            })?;

        for spec in &specs {
            let rendered_path = recipe_templates::render(&spec.path, context)?;
            let target = resolve_under_root(&root, &rendered_path)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let body = content_to_string(&spec.content)?;
            std::fs::write(&target, body)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::FileContent;
    use serde_json::json;
    use serial_test::serial;
    use tempfile::TempDir;

    fn engine() -> Engine {
        Engine {
            registry: std::sync::Arc::new(crate::registry::StepRegistry::new()),
            provider: std::sync::Arc::new(recipe_providers::EchoProvider),
        }
    }

    #[tokio::test]
    async fn writes_text_file_under_root() {
        let dir = TempDir::new().unwrap();
        let config = Map::from_iter([
            ("files_key".into(), json!("files")),
            ("root".into(), json!(dir.path().to_string_lossy().to_string())),
        ]);
        let step = WriteFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        context.set(
            "files",
            json!([{"path": "out.txt", "content": "hello"}]),
        );
        step.execute(&mut context, &engine()).await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let config = Map::from_iter([
            ("files_key".into(), json!("files")),
            ("root".into(), json!(dir.path().to_string_lossy().to_string())),
        ]);
        let step = WriteFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        context.set(
            "files",
            json!([{"path": "nested/deep/out.txt", "content": "hi"}]),
        );
        step.execute(&mut context, &engine()).await.unwrap();
        assert!(dir.path().join("nested/deep/out.txt").exists());
    }

    #[tokio::test]
    async fn rejects_path_escaping_root() {
        let dir = TempDir::new().unwrap();
        let config = Map::from_iter([
            ("files_key".into(), json!("files")),
            ("root".into(), json!(dir.path().to_string_lossy().to_string())),
        ]);
        let step = WriteFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        context.set(
            "files",
            json!([{"path": "../../etc/passwd", "content": "bad"}]),
        );
        let err = step.execute(&mut context, &engine()).await.unwrap_err();
        assert!(matches!(err, RecipeError::RecipeInvalid { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn default_root_accepts_relative_paths() {
        let dir = TempDir::new().unwrap();
        let prev_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let config = Map::from_iter([("files_key".into(), json!("files"))]);
        let step = WriteFilesStep::from_config(&config).unwrap();
        let mut context = Context::new();
        context.set(
            "files",
            json!([{"path": "out.txt", "content": "hello"}]),
        );
        let result = step.execute(&mut context, &engine()).await;

        std::env::set_current_dir(prev_cwd).unwrap();
        result.unwrap();
        assert!(dir.path().join("out.txt").exists());
    }

    #[test]
    fn content_to_string_serializes_structured() {
        let content = FileContent::Structured(json!({"a": 1}));
        let s = content_to_string(&content).unwrap();
        assert!(s.contains("\"a\""));
    }
}
