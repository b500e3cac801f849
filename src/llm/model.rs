//! Model references and schema descriptors
//!
//! Both are opaque to the orchestrator: a [`ModelRef`] only identifies which
//! backend and model to call, a [`Schema`] is forwarded untouched to
//! structured generation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::traits::LanguageModel;

/// Identifies a backing language model: a provider handle plus a model name
#[derive(Clone)]
pub struct ModelRef {
    name: String,
    provider: Arc<dyn LanguageModel>,
}

impl ModelRef {
    /// Create a reference to `name` served by `provider`
    pub fn new(provider: Arc<dyn LanguageModel>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Backend-specific model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend serving this model
    pub fn provider(&self) -> &Arc<dyn LanguageModel> {
        &self.provider
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.name(), self.name)
    }
}

/// JSON schema describing the shape of a structured output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(serde_json::Value);

impl Schema {
    /// Wrap a JSON schema document
    pub fn new(schema: serde_json::Value) -> Self {
        Self(schema)
    }

    /// The underlying schema document
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Schema {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
