//! CLI commands
//!
//! One-shot operations behind the `ensemble` binary.

use std::io::{self, Write};
use std::sync::Arc;

use crate::agent::{Agent, AgentOutput};
use crate::core::{AgentKind, Config, Result};
use crate::llm::{LanguageModel, OllamaClient};
use crate::network::{ExecuteOptions, Network, ResultMap};

/// Build a network served by the configured Ollama instance
pub fn build_network(config: &Config) -> Result<Network> {
    let provider: Arc<dyn LanguageModel> = Arc::new(OllamaClient::from_config(config)?);
    Ok(Network::from_config(config, provider))
}

/// Run one prompt and return what should be printed
///
/// When streaming, fragments go straight to stdout and the returned text only
/// covers agents that were not streamed.
pub async fn run_prompt(
    network: &Network,
    prompt: &str,
    multiple_agents: bool,
    stream: bool,
) -> Result<String> {
    let mut options = ExecuteOptions::new().multiple_agents(multiple_agents);
    if stream {
        options = options.stream_to(|fragment| {
            print!("{}", fragment);
            let _ = io::stdout().flush();
        });
    }

    let results = network.execute(prompt, options).await?;
    format_results(&results)
}

/// Render results sorted by agent name
pub fn format_results(results: &ResultMap) -> Result<String> {
    let mut names: Vec<&String> = results.keys().collect();
    names.sort();

    let mut output = String::new();
    for name in names {
        let body = match &results[name] {
            AgentOutput::Text(result) => result.text.clone(),
            AgentOutput::Object(result) => serde_json::to_string_pretty(&result.object)?,
        };
        if results.len() > 1 {
            output.push_str(&format!("[{}]\n", name));
        }
        output.push_str(&body);
        output.push('\n');
    }

    Ok(output)
}

/// Describe the registered agents
pub fn list_agents(network: &Network) -> String {
    if network.is_empty() {
        return format!(
            "No agents configured. Declare [[agents]] in {}",
            Config::config_file().display()
        );
    }

    let mut output = String::from("Agents:\n");
    for name in network.agent_names() {
        let Some(agent) = network.agent(&name) else {
            continue;
        };
        output.push_str(&format!("  {} ({})\n", name, describe(agent)));
    }
    output
}

fn describe(agent: &Agent) -> String {
    let kind = match agent.kind() {
        AgentKind::Text => "text",
        AgentKind::Object => "object",
    };
    match agent.parameters().model {
        Some(model) => format!("{}, model {}", kind, model.name()),
        None => format!("{}, default model", kind),
    }
}
