//! Wellness inference CLI
//!
//! A command-line tool for querying a running wellness inference service,
//! and for inspecting and evaluating artifact bundles offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{artifacts, health, predict};
use std::path::PathBuf;
use wellness_core::PredictionRequest;

/// Wellness inference CLI
#[derive(Parser)]
#[command(name = "wellness")]
#[command(author, version, about = "CLI for the Employee Wellness inference service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via WELLNESS_API_URL env var)
    #[arg(long, env = "WELLNESS_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one telemetry record with the running service
    Predict(PredictArgs),

    /// Show service health and readiness
    Health,

    /// Load an artifact directory offline and describe it
    InspectArtifacts {
        /// Artifact directory (defaults to the config file value, then ./artifacts)
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Replay a labeled CSV dataset through the serving pipeline offline
    Evaluate {
        /// Labeled CSV with the request columns plus wellness_label
        #[arg(long)]
        data: PathBuf,

        /// Artifact directory (defaults to the config file value, then ./artifacts)
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Fail when accuracy falls below this fraction (0-1)
        #[arg(long)]
        min_accuracy: Option<f64>,
    },
}

#[derive(Args)]
pub struct PredictArgs {
    /// JSON file holding the request body
    #[arg(long, conflicts_with_all = ["focus", "breaks", "after_hours", "sentiment", "department"])]
    pub file: Option<PathBuf>,

    /// Average focus session length in minutes
    #[arg(long, required_unless_present = "file")]
    pub focus: Option<f64>,

    /// Breaks taken per hour
    #[arg(long, required_unless_present = "file")]
    pub breaks: Option<f64>,

    /// Minutes of activity outside working hours
    #[arg(long, required_unless_present = "file")]
    pub after_hours: Option<f64>,

    /// Communication sentiment score between 0 and 1
    #[arg(long, required_unless_present = "file")]
    pub sentiment: Option<f64>,

    /// Department name as used in training
    #[arg(long, required_unless_present = "file")]
    pub department: Option<String>,
}

impl PredictArgs {
    fn into_request(self) -> Result<PredictionRequest> {
        if let Some(path) = &self.file {
            return predict::read_request(path);
        }

        match (
            self.focus,
            self.breaks,
            self.after_hours,
            self.sentiment,
            self.department,
        ) {
            (Some(focus), Some(breaks), Some(after_hours), Some(sentiment), Some(department)) => {
                Ok(PredictionRequest {
                    focus_session_length_minutes: focus,
                    break_frequency_per_hour: breaks,
                    after_hours_activity_minutes: after_hours,
                    communication_sentiment_score: sentiment,
                    department,
                })
            }
            _ => anyhow::bail!("Either --file or all of the telemetry fields are required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    match cli.command {
        Commands::Predict(args) => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            let request = args.into_request()?;
            predict::predict(&client, &request, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&config.api_url(cli.api_url))?;
            health::show_health(&client, cli.format).await?;
        }
        Commands::InspectArtifacts { artifacts: dir } => {
            artifacts::inspect(&config.artifact_dir(dir), cli.format)?;
        }
        Commands::Evaluate {
            data,
            artifacts: dir,
            min_accuracy,
        } => {
            artifacts::run_evaluation(
                &config.artifact_dir(dir),
                &data,
                min_accuracy,
                cli.format,
            )?;
        }
    }

    Ok(())
}
