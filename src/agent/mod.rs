//! Agent module - thin policies over model generation
//!
//! An [`Agent`] is one of a closed set of variants sharing the same
//! capability: `execute`, `stream` and `set_parameters`. Cloning an agent
//! yields another handle onto the same parameters, so the caller and the
//! network observe each other's changes.

pub mod object;
pub mod params;
pub mod text;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{AgentKind, AgentSpec, Result};
use crate::llm::{LanguageModel, ModelRef, ObjectResult, Schema, StreamResult, TextResult};

pub use object::ObjectAgent;
pub use params::{resolve_model, AgentParams};
pub use text::TextAgent;

/// Parameters shared between all handles of one agent
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedParams(Arc<Mutex<AgentParams>>);

impl SharedParams {
    pub(crate) fn new(params: AgentParams) -> Self {
        Self(Arc::new(Mutex::new(params)))
    }

    fn lock(&self) -> MutexGuard<'_, AgentParams> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn merge(&self, patch: AgentParams) {
        self.lock().merge(patch);
    }

    pub(crate) fn snapshot(&self) -> AgentParams {
        self.lock().clone()
    }
}

/// A model-backed agent
#[derive(Debug, Clone)]
pub enum Agent {
    /// Unconstrained text generation
    Text(TextAgent),
    /// Schema-constrained structured generation
    Object(ObjectAgent),
}

/// Completed output of one agent run
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Text(TextResult),
    Object(ObjectResult),
}

impl AgentOutput {
    /// Generated text, for text agents
    pub fn text(&self) -> Option<&str> {
        match self {
            AgentOutput::Text(result) => Some(&result.text),
            AgentOutput::Object(_) => None,
        }
    }

    /// Structured output, for object agents
    pub fn object(&self) -> Option<&serde_json::Value> {
        match self {
            AgentOutput::Text(_) => None,
            AgentOutput::Object(result) => Some(&result.object),
        }
    }
}

impl Agent {
    /// Create a text agent
    pub fn text(params: AgentParams) -> Self {
        Agent::Text(TextAgent::new(params))
    }

    /// Create an object agent
    pub fn object(params: AgentParams) -> Self {
        Agent::Object(ObjectAgent::new(params))
    }

    /// Build an agent from its declarative definition
    ///
    /// A model named in the definition is served by `provider`; without one the
    /// agent inherits the network default at run time.
    pub fn from_spec(spec: &AgentSpec, provider: &Arc<dyn LanguageModel>) -> Self {
        let mut params = AgentParams::new();
        params.model = spec
            .model
            .as_ref()
            .map(|name| ModelRef::new(provider.clone(), name.clone()));
        params.system = spec.system.clone();
        params.max_tokens = spec.max_tokens;
        params.temperature = spec.temperature;
        params.schema = spec.schema.clone().map(Schema::new);

        match spec.kind {
            AgentKind::Text => Agent::text(params),
            AgentKind::Object => Agent::object(params),
        }
    }

    /// Which variant this agent is
    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Text(_) => AgentKind::Text,
            Agent::Object(_) => AgentKind::Object,
        }
    }

    /// Shallow-merge `patch` into the held parameters
    pub fn set_parameters(&self, patch: AgentParams) {
        match self {
            Agent::Text(agent) => agent.set_parameters(patch),
            Agent::Object(agent) => agent.set_parameters(patch),
        }
    }

    /// Snapshot of the current parameters
    pub fn parameters(&self) -> AgentParams {
        match self {
            Agent::Text(agent) => agent.parameters(),
            Agent::Object(agent) => agent.parameters(),
        }
    }

    /// Run to completion
    pub async fn execute(&self) -> Result<AgentOutput> {
        match self {
            Agent::Text(agent) => agent.execute().await.map(AgentOutput::Text),
            Agent::Object(agent) => agent.execute().await.map(AgentOutput::Object),
        }
    }

    /// Start a streamed run
    pub async fn stream(&self) -> Result<StreamResult> {
        match self {
            Agent::Text(agent) => agent.stream().await,
            Agent::Object(agent) => agent.stream().await,
        }
    }
}

impl From<TextAgent> for Agent {
    fn from(agent: TextAgent) -> Self {
        Agent::Text(agent)
    }
}

impl From<ObjectAgent> for Agent {
    fn from(agent: ObjectAgent) -> Self {
        Agent::Object(agent)
    }
}
