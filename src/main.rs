use std::sync::Arc;

use anyhow::{Context, Result};

mod cli;
mod config;
mod core;
mod engines;
mod error;
mod handlers;
mod models;
mod providers;
mod server;
#[cfg(test)]
mod testing;

use crate::{
    core::{
        dialog::DialogGenerator,
        orchestrator::{Interviewer, SearchSettings},
    },
    engines::AmazonSearch,
    handlers::AppState,
    providers::Gemini,
};

async fn run() -> Result<()> {
    let config = config::load_config()?;

    let engine = AmazonSearch::new(&config.search).context("Product search is not configured")?;
    let model = Gemini::new(&config.gemini).context("Gemini is not configured")?;

    let interviewer = Interviewer::new(
        DialogGenerator::new(Arc::new(model)),
        Arc::new(engine),
        SearchSettings::from(&config),
    );

    server::run(&config.server, AppState::new(interviewer)).await
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    log::info!("Starting shopscout...");

    if let Err(err) = run().await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
