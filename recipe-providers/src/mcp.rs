//! ABOUTME: MCP server configuration shapes passed through to the LLM collaborator
//! ABOUTME: Validated only for presence of `url` XOR `command`, not the transport itself

use recipe_core::RecipeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An MCP tool server configuration: either an HTTP endpoint or a
/// stdio-spawned process. The executor never speaks to the server itself; it
/// only templates these fields and hands the result to the LLM collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum McpServerConfig {
    Http {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
        #[serde(default)]
        tool_prefix: Option<String>,
    },
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        tool_prefix: Option<String>,
    },
}

impl McpServerConfig {
    /// A stable key for union/override-on-collision resolution, preferring
    /// `tool_prefix` when set and falling back to the connection target.
    #[must_use]
    pub fn union_key(&self) -> String {
        match self {
            Self::Http { url, tool_prefix, .. } => {
                tool_prefix.clone().unwrap_or_else(|| url.clone())
            }
            Self::Stdio {
                command,
                tool_prefix,
                ..
            } => tool_prefix.clone().unwrap_or_else(|| command.clone()),
        }
    }

    /// Parse and validate a single server config from a `serde_json::Value`,
    /// rejecting shapes with both or neither of `url`/`command`.
    pub fn from_value(value: Value) -> Result<Self, RecipeError> {
        let has_url = value.get("url").is_some();
        let has_command = value.get("command").is_some();
        if has_url == has_command {
            return Err(RecipeError::ConfigInvalid {
                step_type: "llm_generate".to_string(),
                message: "mcp server config must have exactly one of 'url' or 'command'"
                    .to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| RecipeError::ConfigInvalid {
            step_type: "llm_generate".to_string(),
            message: e.to_string(),
        })
    }
}

/// Union two MCP server lists, local entries overriding global ones that
/// share a `union_key()`.
#[must_use]
pub fn union_mcp_servers(
    global: Vec<McpServerConfig>,
    local: Vec<McpServerConfig>,
) -> Vec<McpServerConfig> {
    let mut by_key: Vec<(String, McpServerConfig)> = global
        .into_iter()
        .map(|cfg| (cfg.union_key(), cfg))
        .collect();
    for local_cfg in local {
        let key = local_cfg.union_key();
        if let Some(slot) = by_key.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = local_cfg;
        } else {
            by_key.push((key, local_cfg));
        }
    }
    by_key.into_iter().map(|(_, cfg)| cfg).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_http_config() {
        let value = json!({"url": "https://mcp.example.com", "tool_prefix": "search"});
        let cfg = McpServerConfig::from_value(value).unwrap();
        assert!(matches!(cfg, McpServerConfig::Http { .. }));
    }

    #[test]
    fn parses_stdio_config() {
        let value = json!({"command": "mcp-fs", "args": ["--root", "."]});
        let cfg = McpServerConfig::from_value(value).unwrap();
        assert!(matches!(cfg, McpServerConfig::Stdio { .. }));
    }

    #[test]
    fn rejects_both_url_and_command() {
        let value = json!({"url": "https://x", "command": "y"});
        assert!(McpServerConfig::from_value(value).is_err());
    }

    #[test]
    fn rejects_neither_url_nor_command() {
        let value = json!({"tool_prefix": "x"});
        assert!(McpServerConfig::from_value(value).is_err());
    }

    #[test]
    fn union_prefers_local_on_collision() {
        let global = vec![McpServerConfig::Http {
            url: "https://global.example.com".to_string(),
            headers: HashMap::new(),
            tool_prefix: Some("search".to_string()),
        }];
        let local = vec![McpServerConfig::Http {
            url: "https://local.example.com".to_string(),
            headers: HashMap::new(),
            tool_prefix: Some("search".to_string()),
        }];
        let merged = union_mcp_servers(global, local);
        assert_eq!(merged.len(), 1);
        match &merged[0] {
            McpServerConfig::Http { url, .. } => assert_eq!(url, "https://local.example.com"),
            McpServerConfig::Stdio { .. } => panic!("expected http variant"),
        }
    }

    #[test]
    fn union_keeps_non_colliding_entries() {
        let global = vec![McpServerConfig::Stdio {
            command: "mcp-fs".to_string(),
            args: vec![],
            env: HashMap::new(),
            cwd: None,
            tool_prefix: None,
        }];
        let local = vec![McpServerConfig::Http {
            url: "https://local.example.com".to_string(),
            headers: HashMap::new(),
            tool_prefix: Some("search".to_string()),
        }];
        let merged = union_mcp_servers(global, local);
        assert_eq!(merged.len(), 2);
    }
}
