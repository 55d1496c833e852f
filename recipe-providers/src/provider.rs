//! ABOUTME: The LLM collaborator contract LLMGenerate calls against
//! ABOUTME: Concrete provider SDKs are out of scope; only the trait and a test stub live here

use crate::mcp::McpServerConfig;
use async_trait::async_trait;
use recipe_core::RecipeError;
use serde_json::Value;
use tracing::debug;

/// The runtime output shape LLMGenerate asks the provider for, derived from
/// the step's `output_format` config field.
#[derive(Debug, Clone)]
pub enum OutputType {
    Text,
    Files,
    Schema(Value),
    SchemaArray(Value),
}

/// One call to the LLM collaborator, fully rendered.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub model_id: String,
    pub output_type: OutputType,
    pub max_tokens: Option<u64>,
    pub mcp_servers: Vec<McpServerConfig>,
}

/// The collaborator boundary of spec §6: "Given (prompt, model_id,
/// output_type, max_tokens?, mcp_servers) returns the typed output; errors
/// are exceptions with causes preserved." Concrete implementations (OpenAI,
/// Anthropic, local inference, ...) live outside this workspace; callers
/// inject whichever one they need.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute `request` and return a normalized `Value` ready for storage
    /// under the step's `output_key` — a plain string for `Text`, a JSON
    /// array of file objects for `Files`, or a structured value matching the
    /// requested schema.
    async fn generate(&self, request: LlmRequest) -> Result<Value, RecipeError>;
}

/// A deterministic in-memory stand-in used by tests and dry runs. Echoes the
/// prompt back rather than calling out to a real model.
#[derive(Debug, Default)]
pub struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn generate(&self, request: LlmRequest) -> Result<Value, RecipeError> {
        debug!(model = %request.model_id, prompt_len = request.prompt.len(), "echo provider generating");
        match request.output_type {
            OutputType::Text => Ok(Value::String(request.prompt)),
            OutputType::Files => Ok(Value::Array(vec![serde_json::json!({
                "path": "echo.txt",
                "content": request.prompt,
            })])),
            OutputType::Schema(_) => Ok(serde_json::json!({ "echo": request.prompt })),
            OutputType::SchemaArray(_) => Ok(serde_json::json!({ "items": [request.prompt] })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(output_type: OutputType) -> LlmRequest {
        LlmRequest {
            prompt: "hello".to_string(),
            model_id: "openai/gpt-4o".to_string(),
            output_type,
            max_tokens: None,
            mcp_servers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn echo_provider_returns_text() {
        let out = EchoProvider.generate(request(OutputType::Text)).await.unwrap();
        assert_eq!(out, Value::String("hello".to_string()));
    }

    #[tokio::test]
    async fn echo_provider_returns_file_list() {
        let out = EchoProvider
            .generate(request(OutputType::Files))
            .await
            .unwrap();
        assert!(out.is_array());
        assert_eq!(out[0]["path"], Value::String("echo.txt".to_string()));
    }

    #[tokio::test]
    async fn echo_provider_returns_schema_object() {
        let out = EchoProvider
            .generate(request(OutputType::Schema(serde_json::json!({}))))
            .await
            .unwrap();
        assert!(out.is_object());
    }

    #[tokio::test]
    async fn echo_provider_returns_schema_array() {
        let out = EchoProvider
            .generate(request(OutputType::SchemaArray(serde_json::json!({}))))
            .await
            .unwrap();
        assert!(out["items"].is_array());
    }
}
