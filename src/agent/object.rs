//! Object agent
//!
//! Wraps schema-constrained generation. Both entry points run the same
//! validation before touching the backend.

use tracing::debug;

use crate::agent::{AgentParams, SharedParams};
use crate::core::{EnsembleError, Result};
use crate::llm::{generate_object, stream_object, GenerateParams, ObjectResult, StreamResult};

/// Agent producing structured output shaped by its schema
#[derive(Debug, Clone, Default)]
pub struct ObjectAgent {
    params: SharedParams,
}

impl ObjectAgent {
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

    /// `prompt`, `model` and `schema` must all be present
    fn validate(&self) -> Result<GenerateParams> {
        let params = self.params.snapshot().into_generate_params()?;
        if params.schema.is_none() {
            return Err(EnsembleError::MissingParameter("schema"));
        }
        Ok(params)
    }

    /// Generate the complete object
    pub async fn execute(&self) -> Result<ObjectResult> {
        let params = self.validate()?;
        debug!(model = ?params.model, "object agent execute");
        generate_object(&params).await
    }

    /// Stream the object's JSON text as it is produced
    pub async fn stream(&self) -> Result<StreamResult> {
        let params = self.validate()?;
        debug!(model = ?params.model, "object agent stream");
        stream_object(&params).await
    }
}
