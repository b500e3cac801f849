//! Generation capability abstraction
//!
//! Enables swapping between Ollama, scripted test backends, etc. Agents never
//! talk to a backend directly; they go through the free functions in
//! [`crate::llm::generate`].

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// A single generation request as seen by a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    /// Backend-specific model name
    pub model: String,
    /// User prompt
    pub prompt: String,
    /// System instructions
    pub system: Option<String>,
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    pub temperature: Option<f32>,
    /// JSON schema constraining the output (structured requests only)
    pub schema: Option<serde_json::Value>,
    /// Backend-specific options passed through untouched
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    /// Build the chat messages for this request
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(&self.prompt));
        messages
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build usage from backend counters, if both are reported
    pub fn from_counts(prompt: Option<u32>, completion: Option<u32>) -> Option<Self> {
        match (prompt, completion) {
            (Some(prompt), Some(completion)) => Some(Self {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        }
    }
}

/// Completed text generation
#[derive(Debug, Clone, PartialEq)]
pub struct TextResult {
    /// Generated text
    pub text: String,
    /// Any tool calls the model wants to make
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

/// Completed structured generation
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectResult {
    /// Parsed structured output
    pub object: serde_json::Value,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

/// Lazy, finite, single-pass sequence of text fragments
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Callback invoked once per streamed fragment
pub type StreamCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle over an in-progress streamed generation
pub struct StreamResult {
    /// Fragments in production order
    pub text_stream: TextStream,
}

impl StreamResult {
    /// Wrap a fragment stream
    pub fn new(text_stream: TextStream) -> Self {
        Self { text_stream }
    }

    /// Drain the stream, invoking `on_fragment` for each fragment in order
    pub async fn for_each_fragment(mut self, on_fragment: impl Fn(&str)) -> Result<()> {
        while let Some(fragment) = self.text_stream.next().await {
            on_fragment(&fragment?);
        }
        Ok(())
    }

    /// Drain the stream into the full text
    pub async fn into_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) = self.text_stream.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl std::fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResult").finish_non_exhaustive()
    }
}

/// Trait for model backends
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate unconstrained text
    async fn generate_text(&self, request: &GenerateRequest) -> Result<TextResult>;

    /// Stream unconstrained text fragments
    async fn stream_text(&self, request: &GenerateRequest) -> Result<StreamResult>;

    /// Generate a schema-constrained object
    async fn generate_object(&self, request: &GenerateRequest) -> Result<ObjectResult>;

    /// Stream the raw JSON text of a schema-constrained object
    async fn stream_object(&self, request: &GenerateRequest) -> Result<StreamResult>;

    /// Get the provider name
    fn name(&self) -> &str;
}
