// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sheets v4 client (values read/update over REST).
//!
//! Authenticates with a service-account key file through the GCP SDK's
//! token generator. Errors from the API are passed through unmodified.

use crate::config::Config;
use crate::error::AppError;
use crate::services::crm::read_json;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// A rectangular block of cell values, row-major.
pub type Grid = Vec<Vec<Value>>;

#[derive(Clone)]
enum SheetsAuth {
    ServiceAccount(Arc<GoogleAuthTokenGenerator>),
    /// Pre-issued bearer token (tests, local runs)
    Static(String),
}

/// Client bound to a single spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    /// Create a client authenticated with the configured service-account key.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let generator = GoogleAuthTokenGenerator::new(
            TokenSourceType::File(config.google_credentials_file.clone()),
            vec![SHEETS_SCOPE.to_string()],
        )
        .await
        .map_err(|e| {
            AppError::Config(format!(
                "Failed to load Sheets credentials from {}: {}",
                config.google_credentials_file.display(),
                e
            ))
        })?;

        tracing::info!(spreadsheet = %config.sheet_id, "Sheets client initialized");
        Self::build(config, SheetsAuth::ServiceAccount(Arc::new(generator)))
    }

    /// Create a client that sends a fixed bearer token.
    pub fn with_static_token(config: &Config, token: impl Into<String>) -> Result<Self, AppError> {
        Self::build(config, SheetsAuth::Static(token.into()))
    }

    fn build(config: &Config, auth: SheetsAuth) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client error: {}", e)))?;

        let base_url = Url::parse(&config.sheets_base_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid Sheets base URL {}: {}",
                config.sheets_base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Invalid Sheets base URL {}",
                config.sheets_base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            spreadsheet_id: config.sheet_id.clone(),
            auth,
        })
    }

    async fn bearer(&self) -> Result<String, AppError> {
        match &self.auth {
            SheetsAuth::Static(token) => Ok(token.clone()),
            SheetsAuth::ServiceAccount(generator) => {
                let token = generator
                    .create_token()
                    .await
                    .map_err(|e| AppError::Auth(format!("Sheets token error: {}", e)))?;
                Ok(token.token.as_sensitive_str().to_string())
            }
        }
    }

    /// `{base}/spreadsheets/{id}/...`, each segment percent-encoded as a
    /// path segment (so `Лист1!A2:C6` keeps its `!` and `:`).
    fn spreadsheet_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("spreadsheets")
                .push(&self.spreadsheet_id)
                .extend(segments);
        }
        url
    }

    fn values_url(&self, range: &str) -> Url {
        self.spreadsheet_url(&["values", range])
    }

    /// Read the cells of `range`. Empty ranges return an empty grid.
    pub async fn get_values(&self, range: &str) -> Result<Grid, AppError> {
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;

        let body = read_json(response).await?;
        if body.is_null() {
            return Ok(Grid::new());
        }

        let parsed: ValueRange = serde_json::from_value(body)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Unexpected Sheets response: {}", e)))?;
        tracing::debug!(range, rows = parsed.values.len(), "Read sheet values");
        Ok(parsed.values)
    }

    /// Overwrite `range` with `values` (raw input, no formula parsing).
    pub async fn update_values(&self, range: &str, values: &[Vec<Value>]) -> Result<(), AppError> {
        let response = self
            .http
            .put(self.values_url(range))
            .bearer_auth(self.bearer().await?)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": values }))
            .send()
            .await?;

        read_json(response).await?;
        tracing::debug!(range, rows = values.len(), "Updated sheet values");
        Ok(())
    }

    /// Titles of the sheets (tabs) in the spreadsheet.
    pub async fn sheet_titles(&self) -> Result<Vec<String>, AppError> {
        let response = self
            .http
            .get(self.spreadsheet_url(&[]))
            .bearer_auth(self.bearer().await?)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;

        let body = read_json(response).await?;
        Ok(body
            .get("sheets")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|sheet| sheet.pointer("/properties/title").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

/// Values response body. `values` is omitted for empty ranges.
#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Grid,
}
