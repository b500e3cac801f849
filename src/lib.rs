//! Ensemble - model-driven agent orchestration
//!
//! Register named agents, each a thin policy over a model call, and dispatch
//! a prompt to one or more of them. Which agents run is decided by asking a
//! model.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Generation capability with Ollama and scripted backends
//! - **Agent**: Text and object agents over a shared parameter set
//! - **Network**: Agent registry, selection, and execution policy
//! - **CLI**: One-shot command-line front end
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ensemble::agent::{Agent, AgentParams};
//! use ensemble::llm::{ModelRef, OllamaClient};
//! use ensemble::network::{ExecuteOptions, ModelSelector, Network};
//!
//! #[tokio::main]
//! async fn main() -> ensemble::Result<()> {
//!     let ollama = Arc::new(OllamaClient::new()?);
//!     let model = ModelRef::new(ollama, "qwen3:8b");
//!
//!     let mut network = Network::new(ModelSelector::new(model.clone())).with_default_model(model);
//!     network.register_agent("poet", Agent::text(AgentParams::new().system("You write poems")));
//!
//!     let results = network.execute("A haiku about rust", ExecuteOptions::new()).await?;
//!     println!("{:?}", results.get("poet"));
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod network;

// Re-export commonly used items
pub use agent::{Agent, AgentOutput, AgentParams};
pub use core::{Config, EnsembleError, Result};
pub use network::{ExecuteOptions, Network, ResultMap};
