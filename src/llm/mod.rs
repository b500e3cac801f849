//! LLM module - generation capability
//!
//! Provides the backend abstraction agents delegate to, with Ollama as the
//! primary backend and a scripted backend for deterministic runs.

pub mod generate;
pub mod model;
pub mod ollama;
pub mod scripted;
pub mod traits;

pub use generate::{generate_object, generate_text, stream_object, stream_text, GenerateParams};
pub use model::{ModelRef, Schema};
pub use ollama::OllamaClient;
pub use scripted::ScriptedModel;
pub use traits::{
    GenerateRequest, LanguageModel, ObjectResult, StreamCallback, StreamResult, TextResult,
    TextStream, TokenUsage,
};
