//! ABOUTME: LLM provider abstraction and MCP server configuration for the recipe executor
//! ABOUTME: Concrete provider SDKs are an external collaborator; this crate defines the seam

pub mod mcp;
pub mod model_id;
pub mod provider;

pub use mcp::{union_mcp_servers, McpServerConfig};
pub use model_id::ModelId;
pub use provider::{EchoProvider, LlmProvider, LlmRequest, OutputType};
