//! ABOUTME: Command execution for the recipe executor CLI
//! ABOUTME: `run` wires config/context/recipe together and drives the executor; `validate` stops short of executing

use crate::cli::Commands;
use recipe_core::{load_recipe, Context, Recipe, Result};
use recipe_providers::EchoProvider;
use recipe_workflows::Executor;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Build the layered config map: recipe-declared `env_vars` (lower-cased)
/// first, then `--config` overrides, consistent with §6's stated precedence.
fn build_context_config(recipe: &Recipe, config_args: &[String]) -> Result<Map<String, Value>> {
    let names = recipe.env_vars.clone().unwrap_or_default();
    let env_config = recipe_config::env_vars_config(&names);

    let mut overrides = Vec::with_capacity(config_args.len());
    for raw in config_args {
        let (key, value) = recipe_config::parse_key_value(raw).map_err(|message| {
            recipe_core::RecipeError::ConfigInvalid {
                step_type: "cli".to_string(),
                message,
            }
        })?;
        overrides.push((key, value));
    }

    Ok(recipe_config::build_config(env_config, &overrides))
}

fn build_initial_artifacts(context_args: &[String]) -> Result<Map<String, Value>> {
    let mut artifacts = Map::new();
    for raw in context_args {
        let (key, value) = recipe_config::parse_key_value(raw).map_err(|message| {
            recipe_core::RecipeError::ConfigInvalid {
                step_type: "cli".to_string(),
                message,
            }
        })?;
        artifacts.insert(key, value);
    }
    Ok(artifacts)
}

/// Instantiate every step's factory without executing it, surfacing
/// `UnknownStepType`/`ConfigInvalid` the same way a real run would.
fn validate_recipe(recipe: &Recipe, registry: &recipe_workflows::StepRegistry) -> Result<()> {
    for (index, step) in recipe.steps.iter().enumerate() {
        registry.create(index, &step.step_type, &step.config)?;
    }
    Ok(())
}

pub async fn execute_command(command: Commands) -> Result<()> {
    recipe_config::load_dotenv();

    match command {
        Commands::Validate { recipe_path } => run_validate(&recipe_path),
        Commands::Run {
            recipe_path,
            context,
            config,
            dry_run,
        } => run_recipe(&recipe_path, &context, &config, dry_run).await,
    }
}

fn run_validate(recipe_path: &Path) -> Result<()> {
    let recipe = load_recipe(recipe_path.to_path_buf())?;
    let (registry, _engine) = recipe_workflows::with_defaults(Arc::new(EchoProvider));
    validate_recipe(&recipe, &registry)?;
    info!(path = %recipe_path.display(), step_count = recipe.steps.len(), "recipe is valid");
    Ok(())
}

async fn run_recipe(
    recipe_path: &Path,
    context_args: &[String],
    config_args: &[String],
    dry_run: bool,
) -> Result<()> {
    let recipe = load_recipe(recipe_path.to_path_buf())?;
    let config = build_context_config(&recipe, config_args)?;
    let artifacts = build_initial_artifacts(context_args)?;
    let mut context = Context::with_initial(artifacts, config);

    let (registry, engine) = recipe_workflows::with_defaults(Arc::new(EchoProvider));

    if dry_run {
        validate_recipe(&recipe, &registry)?;
        info!(path = %recipe_path.display(), "dry run: recipe validated, not executed");
        return Ok(());
    }

    let executor = Executor::new(engine);
    let outcome = executor.execute(&recipe, &mut context).await;
    match &outcome {
        Ok(()) => info!(path = %recipe_path.display(), "recipe completed"),
        Err(e) => error!(path = %recipe_path.display(), error = %e, "recipe failed"),
    }
    outcome
}

/// Resolve the log file path for `--log-dir`, creating the directory if
/// needed.
pub fn log_file_path(log_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    Ok(log_dir.join("recipe.log"))
}
