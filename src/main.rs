//! Ensemble - model-driven agent orchestration
//!
//! Main entry point for the CLI application.

use clap::Parser;
use ensemble::{cli, Config};
use tracing_subscriber::EnvFilter;

/// Ensemble - dispatch a prompt to the right agents
#[derive(Parser, Debug)]
#[command(name = "ensemble")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt to run
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Allow dispatching to several agents at once
    #[arg(long, short = 'm')]
    multiple: bool,

    /// Stream agent output as it is generated
    #[arg(long, short = 's')]
    stream: bool,

    /// Network default model
    #[arg(long)]
    model: Option<String>,

    /// List configured agents and exit
    #[arg(long)]
    list_agents: bool,

    /// Write a starter config file and exit
    #[arg(long)]
    init_config: bool,

    /// Replace an existing config file when used with --init-config
    #[arg(long, requires = "init_config")]
    force: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.init_config {
        let config: Config = Config::from_toml(&Config::default_config_toml())?;
        let path = config.save(args.force)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    // Build configuration
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.models.default = Some(model);
    }

    if args.multiple {
        config.selection.multiple_agents = true;
    }

    if args.stream {
        config.streaming.enabled = true;
    }

    let network = cli::build_network(&config)?;

    if args.list_agents {
        print!("{}", cli::list_agents(&network));
        return Ok(());
    }

    let Some(prompt) = args.prompt else {
        anyhow::bail!("No prompt given. Use --prompt \"...\"");
    };

    let output = cli::run_prompt(
        &network,
        &prompt,
        config.selection.multiple_agents,
        config.streaming.enabled,
    )
    .await?;

    if config.streaming.enabled {
        println!();
    }
    print!("{}", output);

    Ok(())
}
