//! Energy Predictor CLI
//!
//! Query a running environmental impact or substation efficiency
//! predictor from the command line.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::predict::{self, EfficiencyArgs, ImpactArgs, ImpactTarget};
use commands::status;

/// Energy Predictor CLI
#[derive(Parser)]
#[command(name = "ep")]
#[command(author, version, about = "CLI for the Energy Predictor services", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via EP_API_URL env var)
    #[arg(long, env = "EP_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the service is live
    Status,

    /// Predict environmental impact of a renewable energy installation
    Impact {
        /// Metric to predict, or `all`
        #[arg(value_enum)]
        target: ImpactTarget,

        #[command(flatten)]
        args: ImpactArgs,
    },

    /// Predict power substation efficiency
    Efficiency {
        #[command(flatten)]
        args: EfficiencyArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url);

    // Initialize client
    let client = client::ApiClient::new(&api_url).context("Failed to create API client")?;

    // Execute command
    match cli.command {
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
        Commands::Impact { target, args } => {
            predict::predict_impact(&client, target, args, cli.format).await?;
        }
        Commands::Efficiency { args } => {
            predict::predict_efficiency(&client, args, cli.format).await?;
        }
    }

    Ok(())
}
