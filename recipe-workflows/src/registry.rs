//! ABOUTME: Name -> step-factory map, the Step Registry of spec §4.3
//! ABOUTME: Populated once at startup; read-only in normal operation thereafter

use crate::step::Step;
use parking_lot::RwLock;
use recipe_core::{RecipeError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::info;

/// A factory takes a step's raw config map and returns a boxed step,
/// performing config validation synchronously (`ConfigInvalid` on failure).
pub type StepFactory = Box<dyn Fn(&Map<String, Value>) -> Result<Box<dyn Step>> + Send + Sync>;

/// Global, process-wide name -> factory mapping. A plain `HashMap` behind a
/// `parking_lot::RwLock` is sufficient: registration happens at startup and
/// the registry is read-only during execution (spec §5 "Shared-resource
/// policy").
pub struct StepRegistry {
    factories: RwLock<HashMap<String, StepFactory>>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StepRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory under `name`. Rejects re-registration of a name
    /// already present, mirroring the registry's startup-only write window.
    pub fn register(&self, name: impl Into<String>, factory: StepFactory) -> Result<()> {
        let name = name.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&name) {
            return Err(RecipeError::ConfigInvalid {
                step_type: name.clone(),
                message: format!("step type '{name}' is already registered"),
            });
        }
        info!(step_type = %name, "step type registered");
        factories.insert(name, factory);
        Ok(())
    }

    /// Instantiate a step of kind `step_type`, raising `UnknownStepType` with
    /// the step's index if no factory is registered under that name.
    pub fn create(
        &self,
        index: usize,
        step_type: &str,
        config: &Map<String, Value>,
    ) -> Result<Box<dyn Step>> {
        let factories = self.factories.read();
        let factory = factories
            .get(step_type)
            .ok_or_else(|| RecipeError::UnknownStepType {
                index,
                step_type: step_type.to_string(),
            })?;
        factory(config)
    }

    /// Whether `step_type` has a registered factory.
    #[must_use]
    pub fn contains(&self, step_type: &str) -> bool {
        self.factories.read().contains_key(step_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recipe_core::Context;

    struct NoopStep;

    #[async_trait]
    impl Step for NoopStep {
        async fn execute(&self, _context: &mut Context, _engine: &crate::step::Engine) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registers_and_creates() {
        let registry = StepRegistry::new();
        registry
            .register("noop", Box::new(|_config| Ok(Box::new(NoopStep) as Box<dyn Step>)))
            .unwrap();
        assert!(registry.contains("noop"));
        assert!(registry.create(0, "noop", &Map::new()).is_ok());
    }

    #[test]
    fn rejects_duplicate_registration() {
        let registry = StepRegistry::new();
        registry
            .register("noop", Box::new(|_config| Ok(Box::new(NoopStep) as Box<dyn Step>)))
            .unwrap();
        assert!(registry
            .register("noop", Box::new(|_config| Ok(Box::new(NoopStep) as Box<dyn Step>)))
            .is_err());
    }

    #[test]
    fn unknown_step_type_carries_index() {
        let registry = StepRegistry::new();
        let err = registry.create(3, "mystery", &Map::new()).err().unwrap();
        match err {
            RecipeError::UnknownStepType { index, step_type } => {
                assert_eq!(index, 3);
                assert_eq!(step_type, "mystery");
            }
            other => panic!("expected UnknownStepType, got {other}"),
        }
    }
}
