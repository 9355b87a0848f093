// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRM event report server
//!
//! Exposes the event report and latency ping jobs over HTTP so an external
//! scheduler can trigger them.

use crm_sheets_report::{
    config::Config,
    diagnostics::ChannelLog,
    services::{FileCredentialStore, SheetsClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting CRM event report service");

    let credentials = Arc::new(FileCredentialStore::new(&config.token_file));
    tracing::info!(path = %credentials.path().display(), "Using token file");

    // Initialize Sheets client
    let sheets = SheetsClient::new(&config).await?;
    match sheets.sheet_titles().await {
        Ok(titles) if titles.iter().any(|t| *t == config.sheet_name) => {
            tracing::info!(sheet = %config.sheet_name, "Report sheet found");
        }
        Ok(titles) => {
            tracing::warn!(
                sheet = %config.sheet_name,
                available = ?titles,
                "Configured sheet not found in spreadsheet"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not list spreadsheet sheets");
        }
    }

    let channel_log = ChannelLog::new(config.log_dir.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        credentials,
        sheets,
        channel_log,
    });

    // Build router
    let app = crm_sheets_report::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crm_sheets_report=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
