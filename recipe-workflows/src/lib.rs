//! ABOUTME: Step registry, executor, and the six built-in step kinds of the recipe executor
//! ABOUTME: `with_defaults` wires every built-in factory under its recipe-facing type name

pub mod executor;
pub mod registry;
pub mod step;
pub mod steps;

pub use executor::Executor;
pub use registry::{StepFactory, StepRegistry};
pub use step::{Engine, Step};

use recipe_providers::LlmProvider;
use std::sync::Arc;

/// Build a registry with every built-in step kind registered under its
/// recipe-facing `type` string. Panics only if a name collides with itself,
/// which would indicate a bug in this function, not caller input.
#[must_use]
pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> (Arc<StepRegistry>, Engine) {
    let registry = StepRegistry::new();

    registry
        .register(
            "execute_recipe",
            Box::new(|config| {
                steps::execute_recipe::ExecuteRecipeStep::from_config(config)
                    .map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");
    registry
        .register(
            "loop",
            Box::new(|config| {
                steps::loop_step::LoopStep::from_config(config).map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");
    registry
        .register(
            "conditional",
            Box::new(|config| {
                steps::conditional::ConditionalStep::from_config(config)
                    .map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");
    registry
        .register(
            "llm_generate",
            Box::new(|config| {
                steps::llm_generate::LlmGenerateStep::from_config(config)
                    .map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");
    registry
        .register(
            "read_files",
            Box::new(|config| {
                steps::read_files::ReadFilesStep::from_config(config)
                    .map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");
    registry
        .register(
            "write_files",
            Box::new(|config| {
                steps::write_files::WriteFilesStep::from_config(config)
                    .map(|s| Box::new(s) as Box<dyn Step>)
            }),
        )
        .expect("built-in step types are unique");

    let registry = Arc::new(registry);
    let engine = Engine {
        registry: registry.clone(),
        provider,
    };
    (registry, engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_providers::EchoProvider;

    #[test]
    fn registers_all_built_in_step_kinds() {
        let (registry, _engine) = with_defaults(Arc::new(EchoProvider));
        for kind in [
            "execute_recipe",
            "loop",
            "conditional",
            "llm_generate",
            "read_files",
            "write_files",
        ] {
            assert!(registry.contains(kind), "missing step kind '{kind}'");
        }
    }
}
