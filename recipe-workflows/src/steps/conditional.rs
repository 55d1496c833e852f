//! ABOUTME: Boolean-expression branching over a templated condition, spec §4.8
//! ABOUTME: Grammar is deliberately closed: literals, file_exists, and/or/not, and bare truthy strings

use crate::executor::Executor;
use crate::step::{Engine, Step};
use async_trait::async_trait;
use recipe_core::{Context, Recipe, RecipeError, RecipeStep, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct Branch {
    #[serde(default)]
    steps: Vec<RecipeStep>,
}

#[derive(Debug, Deserialize)]
struct ConditionalConfig {
    condition: String,
    #[serde(default)]
    if_true: Option<Branch>,
    #[serde(default)]
    if_false: Option<Branch>,
}

pub struct ConditionalStep {
    config: ConditionalConfig,
}

impl ConditionalStep {
    pub fn from_config(config: &Map<String, Value>) -> Result<Self> {
        let config: ConditionalConfig =
            serde_json::from_value(Value::Object(config.clone())).map_err(|e| {
                RecipeError::ConfigInvalid {
                    step_type: "conditional".to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self { config })
    }
}

#[async_trait]
impl Step for ConditionalStep {
    async fn execute(&self, context: &mut Context, engine: &Engine) -> Result<()> {
        let rendered = recipe_templates::render(&self.config.condition, context)?;
        let branch = if evaluate(&self.config.condition, &rendered)? {
            &self.config.if_true
        } else {
            &self.config.if_false
        };

        let Some(branch) = branch else {
            return Ok(());
        };

        let recipe = Recipe {
            steps: branch.steps.clone(),
            env_vars: None,
        };
        let nested = Executor::new(engine.clone());
        nested.execute(&recipe, context).await
    }
}

/// Evaluate a rendered condition string. Anything containing a `(` is
/// required to parse as a full `and`/`or`/`not`/`file_exists` expression or
/// the condition is rejected outright; a paren-free string falls back to a
/// boolean literal or, failing that, truthiness of the non-empty string
/// (spec §4.8 "bare strings that rendered non-empty ... count as truthy").
fn evaluate(raw: &str, rendered: &str) -> Result<bool> {
    let trimmed = rendered.trim();
    if trimmed.contains('(') {
        return match parse_expr(trimmed) {
            Some((value, rest)) if rest.trim().is_empty() => Ok(value),
            _ => Err(RecipeError::ConditionInvalid {
                raw: raw.to_string(),
                rendered: rendered.to_string(),
            }),
        };
    }
    Ok(parse_literal(trimmed).unwrap_or(!trimmed.is_empty()))
}

fn parse_literal(token: &str) -> Option<bool> {
    match token.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_expr(s: &str) -> Option<(bool, &str)> {
    let s = s.trim_start();
    let ident_end = s.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(s.len());
    if ident_end > 0 && s[ident_end..].starts_with('(') {
        return parse_call(&s[..ident_end], &s[ident_end..]);
    }
    let end = s.find([',', ')']).unwrap_or(s.len());
    let token = &s[..end];
    parse_literal(token).map(|value| (value, &s[end..]))
}

fn parse_call<'a>(name: &str, s: &'a str) -> Option<(bool, &'a str)> {
    let rest = s.strip_prefix('(')?;
    match name {
        "file_exists" => {
            let rest = rest.trim_start();
            let rest = rest.strip_prefix('\'')?;
            let close = rest.find('\'')?;
            let path = &rest[..close];
            let rest = rest[close + 1..].trim_start();
            let rest = rest.strip_prefix(')')?;
            Some((std::path::Path::new(path).exists(), rest))
        }
        "not" => {
            let (value, rest) = parse_expr(rest)?;
            let rest = rest.trim_start().strip_prefix(')')?;
            Some((!value, rest))
        }
        "and" | "or" => {
            let mut values = Vec::new();
            let mut cursor = rest;
            loop {
                let (value, after) = parse_expr(cursor)?;
                values.push(value);
                let after = after.trim_start();
                if let Some(next) = after.strip_prefix(',') {
                    cursor = next;
                } else {
                    let tail = after.strip_prefix(')')?;
                    let result = if name == "and" {
                        values.iter().all(|v| *v)
                    } else {
                        values.iter().any(|v| *v)
                    };
                    return Some((result, tail));
                }
            }
        }
        _ => None,
    }
}
