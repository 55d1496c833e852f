//! ABOUTME: Recipe document model and loader
//! ABOUTME: Accepts a parsed Recipe, a JSON mapping, a file path, or raw JSON text

use crate::error::{RecipeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single typed step within a recipe. `config` is interpreted by whichever
/// step kind `step_type` names; the registry resolves that at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl RecipeStep {
    /// Construct and validate a step: `type` must be non-empty.
    pub fn new(step_type: impl Into<String>, config: Map<String, Value>) -> Result<Self> {
        let step_type = step_type.into();
        if step_type.is_empty() {
            return Err(RecipeError::RecipeInvalid {
                message: "step type must not be empty".to_string(),
            });
        }
        Ok(Self { step_type, config })
    }
}

/// The parsed, validated workflow document. Immutable after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub steps: Vec<RecipeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<String>>,
}

impl Recipe {
    fn validate(self) -> Result<Self> {
        for step in &self.steps {
            if step.step_type.is_empty() {
                return Err(RecipeError::RecipeInvalid {
                    message: "step type must not be empty".to_string(),
                });
            }
        }
        Ok(self)
    }

    /// Parse and validate a recipe from a `serde_json::Value` mapping.
    pub fn from_value(value: Value) -> Result<Self> {
        let recipe: Recipe = serde_json::from_value(value).map_err(|e| RecipeError::RecipeInvalid {
            message: e.to_string(),
        })?;
        recipe.validate()
    }

    /// Parse and validate a recipe from raw JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| RecipeError::RecipeParse {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Read, parse, and validate a recipe from a filesystem path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecipeError::RecipeNotFound {
                path: path.display().to_string(),
            });
        }
        debug!(path = %path.display(), "loading recipe from path");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Read, parse, and validate a recipe from a UTF-8 byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| RecipeError::RecipeParse {
            message: e.to_string(),
        })?;
        Self::from_json_str(text)
    }
}

/// The forms a caller may hand the loader, tried in priority order: an
/// already-parsed `Recipe` passes through unchanged; a `Value` mapping is
/// validated; a `Path` that exists is read and parsed; otherwise raw text is
/// parsed as JSON.
pub enum RecipeSource {
    Parsed(Recipe),
    Value(Value),
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<Recipe> for RecipeSource {
    fn from(recipe: Recipe) -> Self {
        RecipeSource::Parsed(recipe)
    }
}

impl From<Value> for RecipeSource {
    fn from(value: Value) -> Self {
        RecipeSource::Value(value)
    }
}

impl From<PathBuf> for RecipeSource {
    fn from(path: PathBuf) -> Self {
        RecipeSource::Path(path)
    }
}

impl From<&Path> for RecipeSource {
    fn from(path: &Path) -> Self {
        RecipeSource::Path(path.to_path_buf())
    }
}

impl From<String> for RecipeSource {
    fn from(text: String) -> Self {
        RecipeSource::Text(text)
    }
}

/// Normalize any `RecipeSource` into a validated `Recipe`.
pub fn load_recipe(source: impl Into<RecipeSource>) -> Result<Recipe> {
    let recipe = match source.into() {
        RecipeSource::Parsed(recipe) => recipe,
        RecipeSource::Value(value) => Recipe::from_value(value)?,
        RecipeSource::Path(path) => Recipe::from_path(&path)?,
        RecipeSource::Text(text) => {
            // A path-shaped string that exists on disk is read as a file;
            // anything else is treated as raw JSON text.
            let as_path = Path::new(&text);
            if as_path.exists() {
                Recipe::from_path(as_path)?
            } else {
                Recipe::from_json_str(&text)?
            }
        }
        RecipeSource::Bytes(bytes) => Recipe::from_bytes(&bytes)?,
    };
    info!(step_count = recipe.steps.len(), "recipe loaded");
    Ok(recipe)
}

/// The content payload of a `FileSpec`: plain text, one structured object,
/// or a list of structured objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Text(String),
    Structured(Value),
    List(Vec<Value>),
}

/// A file to be written, produced by LLMGenerate (`output_format = "files"`)
/// and consumed by `write_files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    pub content: FileContent,
}

impl FileSpec {
    /// Construct a `FileSpec`, validating that `path` is non-empty.
    pub fn new(path: impl Into<String>, content: FileContent) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(RecipeError::RecipeInvalid {
                message: "FileSpec path must not be empty".to_string(),
            });
        }
        Ok(Self { path, content })
    }
}
