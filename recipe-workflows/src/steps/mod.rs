//! ABOUTME: Built-in step kinds, one module per step type named in the registry

pub mod conditional;
pub mod execute_recipe;
pub mod llm_generate;
pub mod loop_step;
pub mod read_files;
pub mod write_files;
