// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, Utc};
use crm_sheets_report::config::Config;
use crm_sheets_report::diagnostics::ChannelLog;
use crm_sheets_report::models::Token;
use crm_sheets_report::routes::create_router;
use crm_sheets_report::services::{CredentialStore, MemoryCredentialStore, SheetsClient};
use crm_sheets_report::AppState;
use httpmock::MockServer;
use std::sync::Arc;

/// Bearer token the Sheets mock expects.
#[allow(dead_code)]
pub const SHEETS_TOKEN: &str = "sheets-test-token";

/// Config pointing both backends at mock servers.
#[allow(dead_code)]
pub fn test_config(crm: &MockServer, sheets: &MockServer) -> Config {
    Config {
        crm_base_url: Some(crm.base_url()),
        sheets_base_url: sheets.base_url(),
        ..Config::test_default()
    }
}

/// A stored token that is good for another hour.
#[allow(dead_code)]
pub fn valid_token() -> Token {
    Token {
        access_token: "stored-access".to_string(),
        refresh_token: "stored-refresh".to_string(),
        token_type: "Bearer".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A stored token that expired an hour ago.
#[allow(dead_code)]
pub fn expired_token() -> Token {
    Token {
        expires_at: Utc::now() - Duration::hours(1),
        ..valid_token()
    }
}

/// Create a test app against mock backends.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    config: Config,
    credentials: Arc<dyn CredentialStore>,
) -> (axum::Router, Arc<AppState>) {
    let sheets = SheetsClient::with_static_token(&config, SHEETS_TOKEN)
        .expect("Failed to build Sheets client");
    let channel_log = ChannelLog::new(config.log_dir.clone());

    let state = Arc::new(AppState {
        config,
        credentials,
        sheets,
        channel_log,
    });

    (create_router(state.clone()), state)
}

/// In-memory store pre-seeded with a valid token.
#[allow(dead_code)]
pub fn seeded_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new(Some(valid_token())))
}
