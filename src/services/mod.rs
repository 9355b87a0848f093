// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregator;
pub mod credentials;
pub mod crm;
pub mod report;
pub mod sheets;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use crm::CrmClient;
pub use report::ReportRunner;
pub use sheets::SheetsClient;
