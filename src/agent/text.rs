//! Text agent
//!
//! Wraps unconstrained text generation. Requires only `prompt` and `model`;
//! every other parameter is passed through as held.

use tracing::debug;

use crate::agent::{AgentParams, SharedParams};
use crate::core::Result;
use crate::llm::{generate_text, stream_text, StreamResult, TextResult};

/// Agent producing free-form text
#[derive(Debug, Clone, Default)]
pub struct TextAgent {
    params: SharedParams,
}

impl TextAgent {
    pub fn new(params: AgentParams) -> Self {
        Self {
            params: SharedParams::new(params),
        }
    }

    pub fn set_parameters(&self, patch: AgentParams) {
        self.params.merge(patch);
    }

    pub fn parameters(&self) -> AgentParams {
        self.params.snapshot()
    }

    /// Generate the full text
    pub async fn execute(&self) -> Result<TextResult> {
        let params = self.params.snapshot().into_generate_params()?;
        debug!(model = ?params.model, "text agent execute");
        generate_text(&params).await
    }

    /// Stream text fragments as they are produced
    pub async fn stream(&self) -> Result<StreamResult> {
        let params = self.params.snapshot().into_generate_params()?;
        debug!(model = ?params.model, "text agent stream");
        stream_text(&params).await
    }
}
