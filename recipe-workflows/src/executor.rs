//! ABOUTME: Sequential step dispatch with StepFailure wrapping, spec §4.5
//! ABOUTME: Stateless across calls; composition steps construct nested executors to recurse

use crate::step::Engine;
use recipe_core::{Context, Recipe, RecipeError, Result};
use std::time::Instant;
use tracing::{debug, error};

/// Drives a `Recipe`'s top-level `steps` array against a shared `Context`.
/// Holds no state beyond its `Engine` handle, so it is naturally re-entrant —
/// composition steps build a fresh `Executor` to run substeps or sub-recipes.
pub struct Executor {
    engine: Engine,
}

impl Executor {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run every step in `recipe` against `context` in order. On the first
    /// failure, wraps the cause as `StepFailure(i, type, cause)` and aborts;
    /// steps already run keep whatever side effects they made.
    pub async fn execute(&self, recipe: &Recipe, context: &mut Context) -> Result<()> {
        for (index, step) in recipe.steps.iter().enumerate() {
            let instance = self
                .engine
                .registry
                .create(index, &step.step_type, &step.config)
                .map_err(|e| match e {
                    RecipeError::UnknownStepType { .. } => e,
                    other => RecipeError::step_failure(index, step.step_type.clone(), other),
                })?;

            let started = Instant::now();
            let outcome = instance.execute(context, &self.engine).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(()) => {
                    debug!(
                        index,
                        step_type = %step.step_type,
                        elapsed_ms = elapsed.as_millis(),
                        "step completed"
                    );
                }
                Err(cause) => {
                    let wrapped = RecipeError::step_failure(index, step.step_type.clone(), cause);
                    error!(index, step_type = %step.step_type, error = %wrapped, "step failed");
                    return Err(wrapped);
                }
            }
        }
        Ok(())
    }
}
