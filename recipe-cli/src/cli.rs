//! ABOUTME: Argument parsing for the recipe executor CLI
//! ABOUTME: `run` executes a recipe; `validate` checks it without executing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recipe")]
#[command(version)]
#[command(about = "Runs declarative, template-driven recipes against an LLM collaborator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory to additionally write logs into, alongside stderr.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a recipe file.
    Run {
        /// Path to the recipe's JSON document.
        recipe_path: PathBuf,

        /// Initial artifact, as `key=value` (repeatable).
        #[arg(long = "context")]
        context: Vec<String>,

        /// Configuration override, as `key=value`, taking precedence over
        /// the environment (repeatable).
        #[arg(long = "config")]
        config: Vec<String>,

        /// Parse and validate the recipe and every step's config without
        /// running it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse and validate a recipe without executing it.
    Validate {
        /// Path to the recipe's JSON document.
        recipe_path: PathBuf,
    },
}
