//! Agent selection
//!
//! Decides which registered agents should handle a prompt. The default
//! [`ModelSelector`] asks a model and parses its comma-separated reply;
//! [`FixedSelector`] returns a preset answer.

use async_trait::async_trait;
use tracing::debug;

use crate::core::Result;
use crate::llm::{generate_text, GenerateParams, ModelRef};

/// Everything a selector may look at
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// The user's prompt
    pub prompt: &'a str,
    /// Currently registered agent names
    pub agents: &'a [String],
    /// Whether more than one agent may be chosen
    pub multiple_agents: bool,
    /// The network's default model, if any
    pub default_model: Option<&'a ModelRef>,
}

/// Chooses agent names for a prompt
///
/// Returned names are not checked against the registry; the network does
/// that when it dispatches.
#[async_trait]
pub trait AgentSelector: Send + Sync {
    async fn select(&self, selection: Selection<'_>) -> Result<Vec<String>>;
}

/// Selector backed by a single text-generation call
#[derive(Debug, Clone)]
pub struct ModelSelector {
    fallback: ModelRef,
    max_tokens: u32,
}

impl ModelSelector {
    /// Output token budget used unless overridden
    pub const DEFAULT_MAX_TOKENS: u32 = 100;

    /// `fallback` is used when the network has no default model
    pub fn new(fallback: ModelRef) -> Self {
        Self {
            fallback,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the output token budget of the selection call
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl AgentSelector for ModelSelector {
    async fn select(&self, selection: Selection<'_>) -> Result<Vec<String>> {
        let model = selection
            .default_model
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        let prompt =
            build_selection_prompt(selection.agents, selection.prompt, selection.multiple_agents);
        debug!(model = ?model, prompt = %prompt, "selecting agents");

        let result = generate_text(&GenerateParams::new(model, prompt).max_tokens(self.max_tokens))
            .await?;
        debug!(reply = %result.text, "selection reply");

        Ok(parse_agent_names(&result.text))
    }
}

/// Selector that always answers with the same names
#[derive(Debug, Clone, Default)]
pub struct FixedSelector {
    names: Vec<String>,
}

impl FixedSelector {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Answer with whatever `reply` parses to, as if a model had said it
    pub fn from_reply(reply: &str) -> Self {
        Self {
            names: parse_agent_names(reply),
        }
    }
}

#[async_trait]
impl AgentSelector for FixedSelector {
    async fn select(&self, _selection: Selection<'_>) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }
}

/// Instruction sent to the model to choose agents
pub fn build_selection_prompt(agents: &[String], prompt: &str, multiple_agents: bool) -> String {
    let count_rule = if multiple_agents {
        "List every agent that should contribute."
    } else {
        "List exactly one agent."
    };

    format!(
        "You route user requests to agents.\n\
         Available agents: {}\n\
         User request: {}\n\
         Should multiple agents be used: {}\n\
         {} Reply with only the agent names, separated by commas, and nothing else.",
        agents.join(", "),
        prompt,
        multiple_agents,
        count_rule
    )
}

/// Split a comma-separated reply into names, trimming each and dropping blanks
///
/// Order and duplicates are preserved.
pub fn parse_agent_names(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
