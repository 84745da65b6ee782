use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use kbchat_app::Orchestrator;
use kbchat_config::AppConfig;
use kbchat_main::{Cli, UI};
use kbchat_services::KbchatServices;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries the conversation
    let default_filter = if cli.verbose { "kbchat=debug" } else { "kbchat=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::load(Some(cli.config.as_path()))?;
    if let Some(preset) = cli.treatment {
        config.treatment.preset = preset;
    }
    let treatment = config.treatment.resolve()?;
    tracing::info!(treatment = %treatment.name, model = %config.model, "Configuration loaded");

    let services = Arc::new(KbchatServices::from_config(&config)?);
    let orch = Orchestrator::new(services, treatment, config.model_id())
        .temperature(config.temperature)
        .max_completion_tokens(config.max_completion_tokens);

    let mut ui = UI::new(orch);
    match cli.prompt {
        Some(prompt) => ui.prompt(prompt).await,
        None => ui.run().await,
    }
}
