//! Agent parameters
//!
//! A partial parameter set held by each agent. Any field may be absent at
//! construction time; `prompt` and `model` must be present by the time the
//! agent runs.

use serde_json::{Map, Value};

use crate::core::{EnsembleError, Result, ToolDefinition};
use crate::llm::{GenerateParams, ModelRef, Schema};

/// Partial generation parameters
#[derive(Debug, Clone, Default)]
pub struct AgentParams {
    /// User prompt
    pub prompt: Option<String>,
    /// Model to run on
    pub model: Option<ModelRef>,
    /// System instructions
    pub system: Option<String>,
    /// Tools the model may call
    pub tools: Option<Vec<ToolDefinition>>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output schema (object agents)
    pub schema: Option<Schema>,
    /// Backend-specific options, merged key by key
    pub extra: Map<String, Value>,
}

impl AgentParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: ModelRef) -> Self {
        self.model = Some(model);
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn schema(mut self, schema: impl Into<Schema>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set a backend-specific option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Shallow merge: every field set in `patch` overwrites, the rest is kept
    pub fn merge(&mut self, patch: AgentParams) {
        if patch.prompt.is_some() {
            self.prompt = patch.prompt;
        }
        if patch.model.is_some() {
            self.model = patch.model;
        }
        if patch.system.is_some() {
            self.system = patch.system;
        }
        if patch.tools.is_some() {
            self.tools = patch.tools;
        }
        if patch.max_tokens.is_some() {
            self.max_tokens = patch.max_tokens;
        }
        if patch.temperature.is_some() {
            self.temperature = patch.temperature;
        }
        if patch.schema.is_some() {
            self.schema = patch.schema;
        }
        self.extra.extend(patch.extra);
    }

    /// Check required keys and produce a complete parameter set
    pub fn into_generate_params(self) -> Result<GenerateParams> {
        let prompt = self
            .prompt
            .ok_or(EnsembleError::MissingParameter("prompt"))?;
        let model = self.model.ok_or(EnsembleError::MissingParameter("model"))?;

        Ok(GenerateParams {
            model,
            prompt,
            system: self.system,
            tools: self.tools.unwrap_or_default(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            schema: self.schema,
            extra: self.extra,
        })
    }
}

/// Pick the model an agent runs on: its own, else the network default
pub fn resolve_model(agent: Option<&ModelRef>, network: Option<&ModelRef>) -> Option<ModelRef> {
    agent.or(network).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use serde_json::json;
    use std::sync::Arc;

    fn model(name: &str) -> ModelRef {
        ModelRef::new(Arc::new(ScriptedModel::new()), name)
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut params = AgentParams::new();
        params.merge(AgentParams::new().option("a", 1));
        params.merge(AgentParams::new().option("b", 2));
        assert_eq!(params.extra, *json!({"a": 1, "b": 2}).as_object().unwrap());

        params.merge(AgentParams::new().option("a", 3));
        assert_eq!(params.extra, *json!({"a": 3, "b": 2}).as_object().unwrap());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut params = AgentParams::new().system("be terse").max_tokens(10);
        params.merge(AgentParams::new().prompt("hello"));

        assert_eq!(params.system.as_deref(), Some("be terse"));
        assert_eq!(params.max_tokens, Some(10));
        assert_eq!(params.prompt.as_deref(), Some("hello"));

        params.merge(AgentParams::new().prompt("again").max_tokens(20));
        assert_eq!(params.prompt.as_deref(), Some("again"));
        assert_eq!(params.max_tokens, Some(20));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut params = AgentParams::new();
        params.merge(AgentParams::new().prompt("p").option("k", "v"));
        params.merge(AgentParams::new().prompt("p").option("k", "v"));
        assert_eq!(params.prompt.as_deref(), Some("p"));
        assert_eq!(params.extra.len(), 1);
    }

    #[test]
    fn test_resolve_model_precedence() {
        let own = model("m1");
        let default = model("m2");

        assert_eq!(resolve_model(Some(&own), Some(&default)).unwrap().name(), "m1");
        assert_eq!(resolve_model(None, Some(&default)).unwrap().name(), "m2");
        assert!(resolve_model(None, None).is_none());
    }

    #[test]
    fn test_into_generate_params_requires_prompt_and_model() {
        let err = AgentParams::new().model(model("m")).into_generate_params();
        assert!(matches!(err, Err(EnsembleError::MissingParameter("prompt"))));

        let err = AgentParams::new().prompt("p").into_generate_params();
        assert!(matches!(err, Err(EnsembleError::MissingParameter("model"))));

        let params = AgentParams::new()
            .prompt("p")
            .model(model("m"))
            .into_generate_params()
            .unwrap();
        assert_eq!(params.prompt, "p");
        assert!(params.tools.is_empty());
    }
}
