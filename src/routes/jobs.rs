// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Job trigger routes, called by the external scheduler.
//!
//! `GET` runs the job and returns its summary. `OPTIONS` is answered with
//! a bare 200 by the CORS layer in [`create_router`](super::create_router).

use crate::error::Result;
use crate::models::{EventReport, PingReport};
use crate::services::{CrmClient, ReportRunner};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Job routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(event_report))
        .route("/ping", get(latency_ping))
}

/// Create a ReportRunner from app state.
/// Each run authenticates against the CRM afresh (reusing the stored token).
async fn create_runner(state: &AppState) -> Result<ReportRunner> {
    let crm = CrmClient::connect(&state.config, state.credentials.clone()).await?;
    Ok(ReportRunner::new(
        crm,
        state.sheets.clone(),
        state.channel_log.clone(),
        state.config.sheet_name.clone(),
    ))
}

/// Run the event report (GET /events).
async fn event_report(State(state): State<Arc<AppState>>) -> Result<Json<EventReport>> {
    let result = async { create_runner(&state).await?.run_event_report().await }.await;
    record_failure(&state, "events", result).map(Json)
}

/// Run the latency ping (GET /ping).
async fn latency_ping(State(state): State<Arc<AppState>>) -> Result<Json<PingReport>> {
    let result = async { create_runner(&state).await?.run_latency_ping().await }.await;
    record_failure(&state, "ping", result).map(Json)
}

/// Append failed runs to the `main_errors` channel.
fn record_failure<T>(state: &AppState, job: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        state.channel_log.record(
            "main_errors",
            &json!({
                "job": job,
                "status": e.status_code().as_u16(),
                "message": e.to_string(),
            }),
        );
    }
    result
}
