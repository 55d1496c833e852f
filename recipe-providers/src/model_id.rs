//! ABOUTME: Parser for the opaque `provider/model[/deployment]` LLM identifier
//! ABOUTME: The core never inspects this beyond passing it to the LLM collaborator

/// A parsed LLM identifier: `model`, `provider/model`, or
/// `provider/model/deployment`. Purely a convenience for collaborators that
/// want structured access; the executor itself treats the identifier as an
/// opaque string (see the glossary entry "LLM identifier").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: Option<String>,
    pub model: String,
    pub deployment: Option<String>,
}

impl ModelId {
    /// Parse `spec` into its constituent parts.
    ///
    /// - `"gpt-4o"` -> `{ provider: None, model: "gpt-4o", deployment: None }`
    /// - `"openai/gpt-4o"` -> `{ provider: Some("openai"), model: "gpt-4o", deployment: None }`
    /// - `"azure/gpt-4o/prod"` -> `{ provider: Some("azure"), model: "gpt-4o", deployment: Some("prod") }`
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        let parts: Vec<&str> = spec.split('/').collect();
        match parts.as_slice() {
            [model] => Some(Self {
                provider: None,
                model: (*model).to_string(),
                deployment: None,
            }),
            [provider, model] => Some(Self {
                provider: Some((*provider).to_string()),
                model: (*model).to_string(),
                deployment: None,
            }),
            [provider, model, deployment] => Some(Self {
                provider: Some((*provider).to_string()),
                model: (*model).to_string(),
                deployment: Some((*deployment).to_string()),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.provider, &self.deployment) {
            (Some(provider), Some(deployment)) => {
                write!(f, "{provider}/{}/{deployment}", self.model)
            }
            (Some(provider), None) => write!(f, "{provider}/{}", self.model),
            (None, _) => write!(f, "{}", self.model),
        }
    }
}
