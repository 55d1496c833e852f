//! ABOUTME: The uniform async step contract and the shared engine handle steps execute against
//! ABOUTME: Composition steps drive nested executors through `Engine`, not through the registry directly

use crate::registry::StepRegistry;
use async_trait::async_trait;
use recipe_core::{Context, Result};
use recipe_providers::LlmProvider;
use std::sync::Arc;

/// Collaborators a step needs beyond its own config and the context:
/// the registry (so composition steps can drive nested executors) and the
/// LLM provider (so `llm_generate` can make its call). Cheap to clone — both
/// fields are `Arc`.
#[derive(Clone)]
pub struct Engine {
    pub registry: Arc<StepRegistry>,
    pub provider: Arc<dyn LlmProvider>,
}

/// Every step kind satisfies this contract. One instance per invocation —
/// steps must not hold state across calls (spec §4.3).
#[async_trait]
pub trait Step: Send + Sync {
    async fn execute(&self, context: &mut Context, engine: &Engine) -> Result<()>;
}
