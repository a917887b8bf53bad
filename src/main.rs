mod cli;
mod config;
mod error;
mod jira;
mod replicate;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::Cli;
use config::Config;
use jira::{JiraClient, TypeCache};
use replicate::Replicator;
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.token.is_some() {
        config.jira.token = cli.token.clone();
    }

    let client = JiraClient::new(&config.jira.base_url, config.jira.token.as_deref())?;
    let replicator = Replicator::new(client, TypeCache::new(), config.replication);
    let state = AppState {
        replicator: Arc::new(replicator),
    };

    info!("Starting asilsync trigger endpoint on {}", cli.bind);
    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Could not bind to {}", cli.bind))?;
    axum::serve(listener, server::router(state))
        .await
        .context("Trigger server stopped")?;

    Ok(())
}
