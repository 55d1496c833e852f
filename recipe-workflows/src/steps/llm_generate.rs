//! ABOUTME: Prompt rendering, MCP server resolution, and typed LLM invocation, spec §4.9
//! ABOUTME: Structured output is validated against its schema before storage

use crate::step::{Engine, Step};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use recipe_core::{Context, RecipeError, Result};
use recipe_providers::{union_mcp_servers, LlmRequest, McpServerConfig, OutputType};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct LlmGenerateConfig {
    prompt: String,
    model: String,
    #[serde(default)]
    max_tokens: Option<u64>,
    output_format: Value,
    output_key: String,
    #[serde(default)]
    mcp_servers: Vec<Value>,
}

pub struct LlmGenerateStep {
    config: LlmGenerateConfig,
}

impl LlmGenerateStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: LlmGenerateConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "llm_generate".to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self { config })
    }
}

fn output_type_for(output_format: &Value) -> Result<OutputType> {
    match output_format {
        Value::String(s) if s == "text" => Ok(OutputType::Text),
        Value::String(s) if s == "files" => Ok(OutputType::Files),
        Value::String(other) => Err(RecipeError::ConfigInvalid {
            step_type: "llm_generate".to_string(),
            message: format!("unknown output_format '{other}'"),
        }),
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("array") => {
            Ok(OutputType::SchemaArray(output_format.clone()))
        }
        Value::Object(_) => Ok(OutputType::Schema(output_format.clone())),
        _ => Err(RecipeError::ConfigInvalid {
            step_type: "llm_generate".to_string(),
            message: "output_format must be a string or a JSON-schema object".to_string(),
        }),
    }
}

fn parse_mcp_list(values: &[Value]) -> Result<Vec<McpServerConfig>> {
    values
        .iter()
        .map(|v| McpServerConfig::from_value(v.clone()))
        .collect()
}

fn validate_schema(schema: &Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::compile(schema).map_err(|e| {
        RecipeError::llm_failed(
            String::new(),
            RecipeError::RecipeInvalid {
                message: format!("invalid output schema: {e}"),
            },
        )
    })?;
    if let Err(errors) = compiled.validate(instance) {
        let message = errors
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RecipeError::llm_failed(
            String::new(),
            RecipeError::RecipeInvalid {
                message: format!("structured output did not match schema: {message}"),
            },
        ));
    }
    Ok(())
}

#[async_trait]
impl Step for LlmGenerateStep {
    async fn execute(&self, context: &mut Context, engine: &Engine) -> Result<()> {
        let prompt = recipe_templates::render(&self.config.prompt, context)?;
        let model = recipe_templates::render(&self.config.model, context)?;
        let output_key = recipe_templates::render(&self.config.output_key, context)?;

        let global_raw = context.config_get("mcp_servers").unwrap_or(Value::Array(Vec::new()));
        let global_rendered = recipe_templates::render_json(&global_raw, context)?;
        let global_servers = match global_rendered {
            Value::Array(items) => parse_mcp_list(&items)?,
            _ => Vec::new(),
        };

        let local_rendered = self
            .config
            .mcp_servers
            .iter()
            .map(|v| recipe_templates::render_json(v, context))
            .collect::<Result<Vec<_>>>()?;
        let local_servers = parse_mcp_list(&local_rendered)?;

        let mcp_servers = union_mcp_servers(global_servers, local_servers);
        let output_type = output_type_for(&self.config.output_format)?;

        let request = LlmRequest {
            prompt,
            model_id: model.clone(),
            output_type: output_type.clone(),
            max_tokens: self.config.max_tokens,
            mcp_servers,
        };

        let raw = engine
            .provider
            .generate(request)
            .await
            .map_err(|e| match e {
                RecipeError::LlmFailed { source, .. } => RecipeError::LlmFailed {
                    model: model.clone(),
                    source,
                },
                other => RecipeError::llm_failed(model.clone(), other),
            })?;

        let normalized = match output_type {
            OutputType::Schema(schema) => {
                validate_schema(&schema, &raw).map_err(|e| retag_model(e, &model))?;
                raw
            }
            OutputType::SchemaArray(schema) => {
                let items = raw.get("items").cloned().ok_or_else(|| {
                    RecipeError::llm_failed(
                        model.clone(),
                        RecipeError::RecipeInvalid {
                            message: "structured output missing 'items' root key".to_string(),
                        },
                    )
                })?;
                validate_schema(
                    &schema,
                    &Value::Array(match &items {
                        Value::Array(v) => v.clone(),
                        _ => {
                            return Err(RecipeError::llm_failed(
                                model.clone(),
                                RecipeError::RecipeInvalid {
                                    message: "'items' was not an array".to_string(),
                                },
                            ))
                        }
                    }),
                )
                .map_err(|e| retag_model(e, &model))?;
                items
            }
            OutputType::Text | OutputType::Files => raw,
        };

        context.set(output_key, normalized);
        Ok(())
    }
}

fn retag_model(err: RecipeError, model: &str) -> RecipeError {
    match err {
        RecipeError::LlmFailed { source, .. } => RecipeError::LlmFailed {
            model: model.to_string(),
            source,
        },
        other => other,
    }
}
