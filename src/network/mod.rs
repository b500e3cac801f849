//! Agent network
//!
//! Owns the agent registry and runs a prompt through it: select agents,
//! fill in each agent's prompt and model, dispatch, and collect results.

pub mod selector;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use crate::agent::{resolve_model, Agent, AgentOutput, AgentParams};
use crate::core::{Config, EnsembleError, Result};
use crate::llm::{LanguageModel, ModelRef, StreamCallback};

pub use selector::{
    build_selection_prompt, parse_agent_names, AgentSelector, FixedSelector, ModelSelector,
    Selection,
};

/// Outputs of one non-streamed run, keyed by agent name
pub type ResultMap = HashMap<String, AgentOutput>;

/// Per-call execution options
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Dispatch every selected agent concurrently instead of only the first
    pub multiple_agents: bool,
    /// Stream agent output through `stream_callback` instead of collecting it
    pub stream: bool,
    /// Receives each streamed fragment in production order
    pub stream_callback: Option<StreamCallback>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiple_agents(mut self, multiple_agents: bool) -> Self {
        self.multiple_agents = multiple_agents;
        self
    }

    /// Stream output, delivering fragments to `callback`
    pub fn stream_to(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.stream = true;
        self.stream_callback = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteOptions")
            .field("multiple_agents", &self.multiple_agents)
            .field("stream", &self.stream)
            .field("stream_callback", &self.stream_callback.is_some())
            .finish()
    }
}

/// Registry of named agents plus the policy for running them
pub struct Network {
    registry: HashMap<String, Agent>,
    default_model: Option<ModelRef>,
    selector: Arc<dyn AgentSelector>,
}

impl Network {
    /// Create an empty network choosing agents with `selector`
    pub fn new(selector: impl AgentSelector + 'static) -> Self {
        Self {
            registry: HashMap::new(),
            default_model: None,
            selector: Arc::new(selector),
        }
    }

    /// Build a network from configuration, serving every model from `provider`
    ///
    /// Agents declared in the config are registered under their names.
    pub fn from_config(config: &Config, provider: Arc<dyn LanguageModel>) -> Self {
        let fallback = ModelRef::new(provider.clone(), config.models.fallback.clone());
        let selector = ModelSelector::new(fallback).max_tokens(config.selection.max_tokens);

        let mut network = Self::new(selector);
        network.default_model = config
            .models
            .default
            .as_ref()
            .map(|name| ModelRef::new(provider.clone(), name.clone()));

        for spec in &config.agents {
            network.register_agent(spec.name.clone(), Agent::from_spec(spec, &provider));
        }

        network
    }

    /// Set the default model for agents that have none of their own
    pub fn with_default_model(mut self, model: ModelRef) -> Self {
        self.default_model = Some(model);
        self
    }

    pub fn set_default_model(&mut self, model: Option<ModelRef>) {
        self.default_model = model;
    }

    pub fn default_model(&self) -> Option<&ModelRef> {
        self.default_model.as_ref()
    }

    /// Register `agent` under `name`, replacing any previous binding
    pub fn register_agent(&mut self, name: impl Into<String>, agent: impl Into<Agent>) {
        self.registry.insert(name.into(), agent.into());
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.registry.get(name)
    }

    /// Registered names, sorted
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Ask the selector which agents should handle `prompt`
    pub async fn infer_agents(&self, prompt: &str, multiple_agents: bool) -> Result<Vec<String>> {
        let agents = self.agent_names();
        self.selector
            .select(Selection {
                prompt,
                agents: &agents,
                multiple_agents,
                default_model: self.default_model.as_ref(),
            })
            .await
    }

    /// Run `prompt` through the network
    ///
    /// With `multiple_agents` unset only the first selected agent runs.
    /// Otherwise all selected agents run concurrently and the call fails as a
    /// whole if any of them fails. Streamed agents deliver their output
    /// through the callback and are left out of the returned map.
    pub async fn execute(&self, prompt: &str, options: ExecuteOptions) -> Result<ResultMap> {
        let names = self.infer_agents(prompt, options.multiple_agents).await?;
        if names.is_empty() {
            return Err(EnsembleError::NoApplicableAgents);
        }

        let dispatched = if options.multiple_agents {
            &names[..]
        } else {
            &names[..1]
        };
        info!(agents = ?dispatched, stream = options.stream, "dispatching");

        let runs = dispatched
            .iter()
            .map(|name| self.run_agent(name, prompt, &options));
        let outputs = try_join_all(runs).await?;

        Ok(outputs.into_iter().flatten().collect())
    }

    async fn run_agent(
        &self,
        name: &str,
        prompt: &str,
        options: &ExecuteOptions,
    ) -> Result<Option<(String, AgentOutput)>> {
        let agent = self
            .registry
            .get(name)
            .ok_or_else(|| EnsembleError::AgentNotRegistered(name.to_string()))?;

        let own_model = agent.parameters().model;
        let mut patch = AgentParams::new().prompt(prompt);
        patch.model = resolve_model(own_model.as_ref(), self.default_model.as_ref());
        agent.set_parameters(patch);

        if options.stream {
            let callback = options.stream_callback.as_ref();
            agent
                .stream()
                .await?
                .for_each_fragment(|fragment| {
                    if let Some(callback) = callback {
                        callback(fragment);
                    }
                })
                .await?;
            return Ok(None);
        }

        let output = agent.execute().await?;
        Ok(Some((name.to_string(), output)))
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("agents", &self.agent_names())
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}
