// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CRM records the report reads. Fields the report ignores are dropped
//! during deserialization.

use serde::{Deserialize, Serialize};

/// CRM account user (a manager or integration account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// CRM activity-feed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmEvent {
    /// Event kind, e.g. `lead_added`. Open set.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    /// Author id (a user id or an external actor id)
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl CrmEvent {
    pub fn new(created_by: i64, event_type: &str) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            created_by: Some(created_by),
            created_at: None,
        }
    }
}
