// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod crm;
pub mod event_type;
pub mod report;
pub mod token;

pub use crm::{CrmEvent, CrmUser};
pub use event_type::{EventCounts, EventType};
pub use report::{EventReport, PingReport, RankedEvent, ReportRow};
pub use token::Token;
