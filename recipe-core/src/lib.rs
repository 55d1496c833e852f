//! ABOUTME: Execution context, recipe model, and error taxonomy for the recipe executor
//! ABOUTME: The orchestration substrate other recipe-executor crates build on

pub mod context;
pub mod error;
pub mod recipe;
pub mod secrets;

pub use context::Context;
pub use error::{RecipeError, Result};
pub use recipe::{load_recipe, FileContent, FileSpec, Recipe, RecipeSource, RecipeStep};
