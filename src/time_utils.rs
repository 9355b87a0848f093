// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Format a date as written to the report header cell (`dd.mm.YYYY`).
pub fn format_sheet_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%d.%m.%Y").to_string()
}

/// Format a timestamp as written next to the ping result
/// (`dd.mm.YYYY HH:MM:SS`).
pub fn format_sheet_timestamp<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%d.%m.%Y %H:%M:%S").to_string()
}

/// Round seconds to two decimal places.
pub fn round_seconds(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
