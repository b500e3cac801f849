//! CLI module - command-line front end
//!
//! Builds a network from configuration and runs one prompt through it.

pub mod commands;

pub use commands::{build_network, format_results, list_agents, run_prompt};
