// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CRM event report: ranks the last day's externally triggered CRM events
//! and publishes them, with a latency probe, to a Google Sheets report.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use diagnostics::ChannelLog;
use services::{CredentialStore, SheetsClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub credentials: Arc<dyn CredentialStore>,
    pub sheets: SheetsClient,
    pub channel_log: ChannelLog,
}
