// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-channel diagnostic dumps.
//!
//! Each channel (`users`, `events`, `top_five`, `main_errors`, ...) is an
//! append-only text file under the log directory holding pretty-printed
//! records. A file that has grown past [`MAX_CHANNEL_BYTES`] is emptied
//! before the next append. Failures here never fail a job.

use crate::time_utils::format_sheet_timestamp;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Size above which a channel file is truncated.
pub const MAX_CHANNEL_BYTES: u64 = 50_000;

const RECORD_SEPARATOR_WIDTH: usize = 120;

#[derive(Serialize)]
struct ChannelRecord<'a, T: Serialize + ?Sized> {
    data: &'a T,
    time: String,
}

/// Sink for diagnostic dumps. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ChannelLog {
    dir: Option<PathBuf>,
}

impl ChannelLog {
    /// Write channels under `dir`; `None` disables file output.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Path of a channel's file, if file output is enabled.
    pub fn channel_path(&self, channel: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{}.txt", channel)))
    }

    /// Append `data` to `channel`.
    pub fn record<T: Serialize + ?Sized>(&self, channel: &str, data: &T) {
        tracing::trace!(channel, "Diagnostic record");

        let Some(path) = self.channel_path(channel) else {
            return;
        };

        if let Err(e) = append_record(&path, data) {
            tracing::warn!(channel, path = %path.display(), error = %e, "Failed to write diagnostic record");
        }
    }
}

fn append_record<T: Serialize + ?Sized>(path: &Path, data: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let oversized = fs::metadata(path)
        .map(|m| m.len() > MAX_CHANNEL_BYTES)
        .unwrap_or(false);
    if oversized {
        fs::write(path, "")?;
    }

    let record = ChannelRecord {
        data,
        time: format_sheet_timestamp(&Local::now()),
    };
    let rendered = serde_json::to_string_pretty(&record).map_err(std::io::Error::other)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(
        file,
        "{}\n\n{}\n\n",
        rendered,
        "=".repeat(RECORD_SEPARATOR_WIDTH)
    )
}
