// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence for the CRM token set.
//!
//! There is no locking: two overlapping runs may overwrite each other's
//! token and the last writer wins.

use crate::error::AppError;
use crate::models::Token;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Load/save access to the stored token.
pub trait CredentialStore: Send + Sync {
    /// Read the stored token. A missing or unreadable token is `None`.
    fn load(&self) -> Option<Token>;

    /// Replace the stored token.
    fn save(&self, token: &Token) -> Result<(), AppError>;
}

/// Token stored as a JSON document on local disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Token> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "No stored token");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring malformed token file"
                );
                None
            }
        }
    }

    fn save(&self, token: &Token) -> Result<(), AppError> {
        let json = serde_json::to_string(token)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write token file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }
}

/// In-process token store (tests, dry runs).
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<Token>>,
}

impl MemoryCredentialStore {
    pub fn new(token: Option<Token>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Token> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, token: &Token) -> Result<(), AppError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Token store lock poisoned")))?;
        *guard = Some(token.clone());
        Ok(())
    }
}
