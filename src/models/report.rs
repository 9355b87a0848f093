// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Job results returned by the trigger endpoints.

use crate::models::EventType;
use serde::{Deserialize, Serialize};

/// One ranked entry of the top-N list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEvent {
    pub event_type: EventType,
    pub count: u64,
}

/// A `(label, count)` row as written to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub count: u64,
}

impl From<RankedEvent> for ReportRow {
    fn from(ranked: RankedEvent) -> Self {
        Self {
            label: ranked.event_type.label().to_string(),
            count: ranked.count,
        }
    }
}

/// Summary of an event report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReport {
    /// Report date as written to the header cell
    pub date: String,
    pub users: usize,
    pub events: usize,
    pub top: Vec<ReportRow>,
    /// Rows moved from the live region into the archive
    pub archived: usize,
}

/// Summary of a latency ping run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingReport {
    /// Round-trip time of the probe request, two decimals
    pub seconds: f64,
    pub timestamp: String,
}
