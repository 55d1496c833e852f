//! ABOUTME: Sub-recipe invocation with context overrides, spec §4.6
//! ABOUTME: Overrides land in the shared context and are not reverted on return

use crate::executor::Executor;
use crate::step::{Engine, Step};
use async_trait::async_trait;
use recipe_core::{load_recipe, Context, RecipeError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ExecuteRecipeConfig {
    recipe_path: String,
    #[serde(default)]
    context_overrides: Map<String, Value>,
}

pub struct ExecuteRecipeStep {
    config: ExecuteRecipeConfig,
}

impl ExecuteRecipeStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: ExecuteRecipeConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "execute_recipe".to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self { config })
    }
}

#[async_trait]
impl Step for ExecuteRecipeStep {
    async fn execute(&self, context: &mut Context, engine: &Engine) -> Result<()> {
        // Overrides are rendered and assigned into the *same* context, before
        // the sub-recipe runs, and are never reverted on return (spec §9 Open
        // Question #2 — preserved, consistent with the sample code).
        for (key, template) in &self.config.context_overrides {
            let template = template.as_str().ok_or_else(|| RecipeError::ConfigInvalid {
                step_type: "execute_recipe".to_string(),
                message: format!("context_overrides['{key}'] must be a string template"),
            })?;
            let rendered = recipe_templates::render(template, context)?;
            context.set(key.clone(), Value::String(rendered));
        }

        let path = recipe_templates::render(&self.config.recipe_path, context)?;
        if !Path::new(&path).exists() {
            return Err(RecipeError::FileMissing { path });
        }

        let recipe = load_recipe(Path::new(&path).to_path_buf())?;
        let nested = Executor::new(engine.clone());
        nested.execute(&recipe, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StepRegistry;
    use recipe_providers::EchoProvider;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn engine() -> Engine {
        Engine {
            registry: Arc::new(StepRegistry::new()),
            provider: Arc::new(EchoProvider),
        }
    }

    #[tokio::test]
    async fn missing_sub_recipe_path_is_file_missing() {
        let config = Map::from_iter([("recipe_path".into(), json!("/does/not/exist.json"))]);
        let step = ExecuteRecipeStep::from_config(&config).unwrap();
        let mut context = Context::new();
        let err = step.execute(&mut context, &engine()).await.unwrap_err();
        assert!(matches!(err, RecipeError::FileMissing { .. }));
    }

    #[tokio::test]
    async fn overrides_apply_before_sub_recipe_runs_and_persist() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"steps": []}}"#).unwrap();
        let config = Map::from_iter([
            (
                "recipe_path".into(),
                json!(file.path().to_string_lossy().to_string()),
            ),
            (
                "context_overrides".into(),
                json!({"name": "{{name}}_child"}),
            ),
        ]);
        let step = ExecuteRecipeStep::from_config(&config).unwrap();
        let mut context = Context::new();
        context.set("name", json!("A"));
        step.execute(&mut context, &engine()).await.unwrap();
        assert_eq!(context.get("name").unwrap(), json!("A_child"));
    }

    #[test]
    fn rejects_missing_recipe_path() {
        assert!(ExecuteRecipeStep::from_config(&Map::new()).is_err());
    }
}
