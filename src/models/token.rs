// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CRM OAuth token set persisted between runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token set for the CRM API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Absolute expiry (Unix seconds). Older token files stored this
    /// under `expires_in`.
    #[serde(with = "chrono::serde::ts_seconds", alias = "expires_in")]
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Whether the access token is unusable at `now`, treating anything
    /// inside `margin` of its expiry as already expired.
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}
