//! Attrition Explain - Main Entry Point
//!
//! Scores employee records against a fitted pipeline and explains each prediction.

use attrition_explain::cli::{cmd_inspect, cmd_predict, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attrition_explain=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict { model, record, fields, top_factors, json } => {
            cmd_predict(model, record.as_deref(), fields, top_factors, json).await?;
        }
        Commands::Inspect { model } => {
            cmd_inspect(model)?;
        }
    }

    Ok(())
}
