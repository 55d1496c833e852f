//! ABOUTME: Error types for the recipe executor
//! ABOUTME: Provides RecipeError enum and Result type alias

use thiserror::Error;

/// Comprehensive error enum for all recipe execution failures.
///
/// Each variant corresponds to a row in the error taxonomy: kinds are raised
/// by a specific layer (loader, context, renderer, step) and propagate up
/// through the executor, which wraps the offending step in `StepFailure`.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe invalid: {message}")]
    RecipeInvalid { message: String },

    #[error("recipe not found: {path}")]
    RecipeNotFound { path: String },

    #[error("failed to parse recipe: {message}")]
    RecipeParse { message: String },

    #[error("unknown step type '{step_type}' at index {index}")]
    UnknownStepType { index: usize, step_type: String },

    #[error("invalid config for step '{step_type}': {message}")]
    ConfigInvalid { step_type: String, message: String },

    #[error("key missing from context: {key}")]
    KeyMissing { key: String },

    #[error("template error: {message}")]
    Template { message: String },

    #[error("file missing: {path}")]
    FileMissing { path: String },

    #[error("condition invalid: raw='{raw}' rendered='{rendered}'")]
    ConditionInvalid { raw: String, rendered: String },

    #[error("loop items invalid: {message}")]
    LoopItemsInvalid { message: String },

    #[error("loop item '{key}' failed: {source}")]
    LoopItemFailed {
        key: String,
        #[source]
        source: Box<RecipeError>,
    },

    #[error("llm generation failed for model '{model}': {source}")]
    LlmFailed {
        model: String,
        #[source]
        source: Box<RecipeError>,
    },

    #[error("step {index} ({step_type}) failed: {source}")]
    StepFailure {
        index: usize,
        step_type: String,
        #[source]
        source: Box<RecipeError>,
    },

    #[error("io error: {message}")]
    Io { message: String },
}

impl RecipeError {
    /// Wrap any error as a `StepFailure`, preserving the chain.
    #[must_use]
    pub fn step_failure(index: usize, step_type: impl Into<String>, source: RecipeError) -> Self {
        RecipeError::StepFailure {
            index,
            step_type: step_type.into(),
            source: Box::new(source),
        }
    }

    /// Wrap any error as a `LoopItemFailed`, preserving the chain.
    #[must_use]
    pub fn loop_item_failed(key: impl Into<String>, source: RecipeError) -> Self {
        RecipeError::LoopItemFailed {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Wrap any error as an `LlmFailed`, preserving the chain.
    #[must_use]
    pub fn llm_failed(model: impl Into<String>, source: RecipeError) -> Self {
        RecipeError::LlmFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

impl From<std::io::Error> for RecipeError {
    fn from(err: std::io::Error) -> Self {
        RecipeError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::RecipeParse {
            message: err.to_string(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RecipeError>;
