// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report jobs.
//!
//! Event report:
//! 1. Fetch users and the last 24 hours of events from the CRM
//! 2. Count events not authored by users, keep the top five
//! 3. Read the live region, move it into the archive region
//! 4. Write today's date and the new (label, count) rows
//!
//! The live region is only overwritten after the archive writes succeed,
//! so a failed run never loses the previous report.
//!
//! Latency ping: time one CRM request and record it with a timestamp.
//!
//! Every step is awaited in order; the first error aborts the job.

use crate::diagnostics::ChannelLog;
use crate::error::Result;
use crate::models::{CrmEvent, CrmUser, EventReport, PingReport, ReportRow};
use crate::services::aggregator::{aggregate, top_n};
use crate::services::crm::{CrmClient, QueryParams};
use crate::services::sheets::{Grid, SheetsClient};
use crate::time_utils::{format_sheet_date, format_sheet_timestamp, round_seconds};
use chrono::{DateTime, Local, Utc};
use serde_json::{json, Value};
use std::time::Instant;

/// Current top five: date in column A, (label, count) in B:C.
pub const LIVE_REGION: &str = "A2:C6";
/// Header cell holding the report date.
pub const DATE_CELL: &str = "A2";
/// Where the new (label, count) rows go.
pub const LIVE_ROWS: &str = "B2:C6";
/// Receives the previous report's date.
pub const HISTORY_HEAD_CELL: &str = "A10";
/// Receives the previous report's (label, count) rows.
pub const ARCHIVE_ROWS: &str = "B10:C14";
pub const PING_SECONDS_CELL: &str = "E2";
pub const PING_TIMESTAMP_CELL: &str = "F2";

const TOP_N: usize = 5;
const REPORT_WINDOW_SECS: i64 = 24 * 60 * 60;

/// The live region rearranged for the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedRegion {
    /// First cell of the first old row (the previous date)
    pub history_head: Option<Value>,
    /// Old `(label, count)` rows
    pub rows: Grid,
}

/// Reshape the old live region into archive rows.
///
/// The Sheets API drops trailing empty cells, so short rows are padded
/// with `""` / `0`. Counts stored as text are parsed.
pub fn archive_live_region(old: &[Vec<Value>]) -> ArchivedRegion {
    let history_head = old
        .first()
        .map(|row| row.first().cloned().unwrap_or_else(|| json!("")));

    let rows = old
        .iter()
        .map(|row| vec![json!(cell_text(row.get(1))), json!(cell_count(row.get(2)))])
        .collect();

    ArchivedRegion { history_head, rows }
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn cell_count(cell: Option<&Value>) -> i64 {
    match cell {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Runs the report jobs against one CRM session and one spreadsheet.
pub struct ReportRunner {
    crm: CrmClient,
    sheets: SheetsClient,
    log: ChannelLog,
    sheet_name: String,
}

impl ReportRunner {
    pub fn new(
        crm: CrmClient,
        sheets: SheetsClient,
        log: ChannelLog,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            crm,
            sheets,
            log,
            sheet_name: sheet_name.into(),
        }
    }

    fn range(&self, span: &str) -> String {
        format!("{}!{}", self.sheet_name, span)
    }

    /// Run the event report for the 24 hours ending now.
    pub async fn run_event_report(&self) -> Result<EventReport> {
        self.run_event_report_at(Utc::now()).await
    }

    /// Run the event report for the 24 hours ending at `now`.
    pub async fn run_event_report_at(&self, now: DateTime<Utc>) -> Result<EventReport> {
        tracing::info!(sheet = %self.sheet_name, "Starting event report");

        // 1. Users and the window's events
        let users: Vec<CrmUser> = self.crm.get_all_as("users", None).await?;
        self.log.record("users", &users);

        let to = now.timestamp();
        let from = to - REPORT_WINDOW_SECS;
        let window = QueryParams::from([
            ("filter[created_at][from]".to_string(), from.to_string()),
            ("filter[created_at][to]".to_string(), to.to_string()),
        ]);
        let events: Vec<CrmEvent> = self.crm.get_all_as("events", Some(window)).await?;
        self.log.record("events", &events);

        tracing::info!(users = users.len(), events = events.len(), "Fetched CRM data");

        // 2. Count and rank
        let counts = aggregate(&users, &events);
        let top = top_n(&counts, TOP_N);
        self.log.record("top_five", &top);

        // 3. Localize
        let rows: Vec<ReportRow> = top.into_iter().map(ReportRow::from).collect();
        self.log.record("localized", &rows);

        // 4. Move the previous report into the archive
        let old = self.sheets.get_values(&self.range(LIVE_REGION)).await?;
        self.log.record("old_data", &old);

        let archived = archive_live_region(&old);
        if let Some(head) = &archived.history_head {
            self.sheets
                .update_values(&self.range(HISTORY_HEAD_CELL), &[vec![head.clone()]])
                .await?;
        }
        self.log.record("formatted_data", &archived.rows);

        if !archived.rows.is_empty() {
            self.sheets
                .update_values(&self.range(ARCHIVE_ROWS), &archived.rows)
                .await?;
        }

        // 5. Only once the archive is safe: date header, then the new rows
        let date = format_sheet_date(&now.with_timezone(&Local));
        self.sheets
            .update_values(&self.range(DATE_CELL), &[vec![json!(date)]])
            .await?;

        let live: Grid = rows
            .iter()
            .map(|row| vec![json!(row.label), json!(row.count)])
            .collect();
        self.sheets
            .update_values(&self.range(LIVE_ROWS), &live)
            .await?;

        tracing::info!(date = %date, archived = archived.rows.len(), "Event report written");

        Ok(EventReport {
            date,
            users: users.len(),
            events: events.len(),
            top: rows,
            archived: archived.rows.len(),
        })
    }

    /// Time a single leads request and record it.
    pub async fn run_latency_ping(&self) -> Result<PingReport> {
        let started = Instant::now();
        self.crm.get("leads", &QueryParams::new()).await?;
        let seconds = round_seconds(started.elapsed().as_secs_f64());

        let timestamp = format_sheet_timestamp(&Local::now());
        self.sheets
            .update_values(&self.range(PING_SECONDS_CELL), &[vec![json!(seconds)]])
            .await?;
        self.sheets
            .update_values(&self.range(PING_TIMESTAMP_CELL), &[vec![json!(timestamp)]])
            .await?;

        tracing::info!(seconds, "Latency ping recorded");
        Ok(PingReport { seconds, timestamp })
    }
}
