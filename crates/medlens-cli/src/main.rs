use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;

#[derive(Parser)]
#[command(name = "medlens")]
#[command(about = "MedLens CLI - LLM communication tracking for healthcare AI agents", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to $MEDLENS_CONFIG or ~/.config/medlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an LLM provider error message
    Classify {
        message: String,
        /// Native HTTP status code reported alongside the message
        #[arg(long)]
        status: Option<u16>,
    },
    /// Estimate the cost of a call from its token counts
    Cost {
        #[arg(long, default_value = "openai")]
        provider: String,
        #[arg(long)]
        model: String,
        #[arg(long, default_value_t = 0)]
        input: u64,
        #[arg(long, default_value_t = 0)]
        output: u64,
    },
    /// Run scripted AutoGen and CrewAI style agents through the tracker
    Demo {
        /// Print the tracker lifecycle events captured during the run
        #[arg(long)]
        events: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = bootstrap::load_config(cli.config)?;

    match cli.command {
        Commands::Classify { message, status } => {
            bootstrap::init_logging(&config, None)?;
            commands::classify::run(&message, status)?;
        }
        Commands::Cost {
            provider,
            model,
            input,
            output,
        } => {
            bootstrap::init_logging(&config, None)?;
            commands::cost::run(&config, &provider, &model, input, output)?;
        }
        Commands::Demo { events } => {
            let receiver = if events {
                let (layer, receiver) = medlens_telemetry::LifecycleEventLayer::channel();
                bootstrap::init_logging(&config, Some(layer))?;
                Some(receiver)
            } else {
                bootstrap::init_logging(&config, None)?;
                None
            };
            let tracker = bootstrap::build_tracker(&config)?;
            commands::demo::run(tracker, receiver).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cost() {
        let cli = Cli::parse_from([
            "medlens", "cost", "--model", "gpt-4", "--input", "1000", "--output", "1000",
        ]);
        match cli.command {
            Commands::Cost {
                provider,
                model,
                input,
                output,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(model, "gpt-4");
                assert_eq!((input, output), (1000, 1000));
            }
            _ => panic!("Expected Cost command"),
        }
    }
}
