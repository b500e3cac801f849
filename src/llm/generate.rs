//! Generation entry points
//!
//! Each function takes a completed parameter set and dispatches to the
//! backend named by its model reference.

use tracing::debug;

use crate::core::{EnsembleError, Result, ToolDefinition};
use crate::llm::model::{ModelRef, Schema};
use crate::llm::traits::{GenerateRequest, ObjectResult, StreamResult, TextResult};

/// Fully resolved generation parameters
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: ModelRef,
    pub prompt: String,
    pub system: Option<String>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub schema: Option<Schema>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GenerateParams {
    /// Minimal parameter set: a model and a prompt
    pub fn new(model: ModelRef, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            system: None,
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
            schema: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the output token budget
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request(&self) -> GenerateRequest {
        GenerateRequest {
            model: self.model.name().to_string(),
            prompt: self.prompt.clone(),
            system: self.system.clone(),
            tools: self.tools.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            schema: self.schema.as_ref().map(|s| s.as_json().clone()),
            extra: self.extra.clone(),
        }
    }

    fn object_request(&self) -> Result<GenerateRequest> {
        if self.schema.is_none() {
            return Err(EnsembleError::MissingParameter("schema"));
        }
        Ok(self.request())
    }
}

/// Generate unconstrained text
pub async fn generate_text(params: &GenerateParams) -> Result<TextResult> {
    debug!(model = ?params.model, "generate_text");
    params
        .model
        .provider()
        .generate_text(&params.request())
        .await
}

/// Stream unconstrained text fragments
pub async fn stream_text(params: &GenerateParams) -> Result<StreamResult> {
    debug!(model = ?params.model, "stream_text");
    params.model.provider().stream_text(&params.request()).await
}

/// Generate a schema-constrained object
pub async fn generate_object(params: &GenerateParams) -> Result<ObjectResult> {
    debug!(model = ?params.model, "generate_object");
    let request = params.object_request()?;
    params.model.provider().generate_object(&request).await
}

/// Stream the JSON text of a schema-constrained object
pub async fn stream_object(params: &GenerateParams) -> Result<StreamResult> {
    debug!(model = ?params.model, "stream_object");
    let request = params.object_request()?;
    params.model.provider().stream_object(&request).await
}
