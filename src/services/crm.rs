// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRM (amoCRM v4) API client.
//!
//! Handles:
//! - Token lifecycle: reuse a stored token, refresh it when expired, or
//!   exchange the one-time authorization code when nothing is stored
//! - Authenticated GET/POST/PATCH with status → error translation
//! - Paginated bulk listing with a fixed inter-page delay

use crate::config::Config;
use crate::error::AppError;
use crate::models::Token;
use crate::services::credentials::CredentialStore;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Items requested per page in bulk listings.
pub const PAGE_LIMIT: u32 = 250;

/// Margin before token expiration when we proactively refresh.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const USER_AGENT: &str = "amoCRM-oAuth-client/1.0";

/// Query parameters for CRM requests. Later inserts override earlier ones.
pub type QueryParams = BTreeMap<String, String>;

/// Authenticated CRM client. Construct with [`CrmClient::connect`].
#[derive(Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    origin: String,
    access_token: String,
    page_delay: Duration,
    max_pages: u32,
}

impl CrmClient {
    /// Build a ready-to-use client, acquiring a token if needed.
    ///
    /// - stored token still valid: used as is, no network calls
    /// - stored token expired: refresh-token grant, then persisted
    /// - nothing stored: authorization-code grant, then persisted
    pub async fn connect(
        config: &Config,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client error: {}", e)))?;

        let origin = config.crm_origin();
        let oauth = OAuthApp {
            http: &http,
            token_url: format!("{}/oauth2/access_token", origin),
            config,
        };

        let margin = ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        let token = match store.load() {
            Some(token) if !token.is_expired(Utc::now(), margin) => {
                tracing::debug!(expires_at = %token.expires_at, "Using stored CRM token");
                token
            }
            Some(token) => {
                tracing::info!(expires_at = %token.expires_at, "CRM token expired, refreshing");
                let fresh = oauth.refresh(&token.refresh_token).await?;
                store.save(&fresh)?;
                fresh
            }
            None => {
                tracing::info!("No stored CRM token, exchanging authorization code");
                let fresh = oauth.exchange_code().await?;
                store.save(&fresh)?;
                fresh
            }
        };

        Ok(Self {
            http,
            origin,
            access_token: token.access_token,
            page_delay: config.page_delay,
            max_pages: config.max_pages,
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/v4/{}",
            self.origin,
            endpoint.trim_start_matches('/')
        )
    }

    /// Single authenticated GET.
    pub async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.api_url(endpoint))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        read_json(response).await
    }

    /// Single authenticated POST or PATCH with a JSON body.
    pub async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        method: Method,
    ) -> Result<Value, AppError> {
        if method != Method::POST && method != Method::PATCH {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Unsupported method for CRM write: {}",
                method
            )));
        }

        let response = self
            .http
            .request(method, self.api_url(endpoint))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch every item of `entity`, one page at a time.
    ///
    /// Stops at the first page whose `_embedded.{entity}` array is absent or
    /// empty. Caller parameters override the defaults.
    pub async fn get_all(
        &self,
        entity: &str,
        extra_params: Option<QueryParams>,
    ) -> Result<Vec<Value>, AppError> {
        let mut params = default_list_params(entity);
        if let Some(extra) = extra_params {
            params.extend(extra);
        }

        let mut results = Vec::new();
        for page in 1..=self.max_pages {
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            params.insert("page".to_string(), page.to_string());
            let response = self.get(entity, &params).await?;

            let items = match embedded_items(response, entity) {
                Some(items) if !items.is_empty() => items,
                _ => {
                    tracing::debug!(entity, page, total = results.len(), "Listing complete");
                    return Ok(results);
                }
            };

            tracing::debug!(entity, page, count = items.len(), "Fetched page");
            results.extend(items);
        }

        tracing::warn!(entity, max_pages = self.max_pages, "Pagination limit reached");
        Err(AppError::PaginationLimitExceeded {
            entity: entity.to_string(),
            max_pages: self.max_pages,
        })
    }

    /// [`get_all`](Self::get_all), deserializing each item.
    pub async fn get_all_as<T: DeserializeOwned>(
        &self,
        entity: &str,
        extra_params: Option<QueryParams>,
    ) -> Result<Vec<T>, AppError> {
        self.get_all(entity, extra_params)
            .await?
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Unexpected {} item: {}", entity, e))
                })
            })
            .collect()
    }
}

/// Default `limit`/`with` parameters for a bulk listing.
pub fn default_list_params(entity: &str) -> QueryParams {
    let with = match entity {
        "leads" => "contacts",
        "contacts" => "leads",
        _ => "leads,contacts",
    };

    QueryParams::from([
        ("limit".to_string(), PAGE_LIMIT.to_string()),
        ("with".to_string(), with.to_string()),
    ])
}

/// Take the `_embedded.{entity}` array out of a listing response.
fn embedded_items(mut response: Value, entity: &str) -> Option<Vec<Value>> {
    match response.get_mut("_embedded")?.get_mut(entity)?.take() {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Value of a custom field from an entity's `custom_fields_values` array,
/// or an empty string when the field is not set.
pub fn custom_field_value(custom_fields_values: &Value, field_id: i64) -> String {
    custom_fields_values
        .as_array()
        .into_iter()
        .flatten()
        .filter(|field| field.get("field_id").and_then(Value::as_i64) == Some(field_id))
        .filter_map(|field| field.pointer("/values/0/value"))
        .last()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Check response status and parse the JSON body.
///
/// Empty 2xx bodies (the CRM answers 204 for empty listings) become `null`.
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Upstream API returned an error");
        return Err(AppError::api(status.as_u16(), body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON parse error: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth grants
// ─────────────────────────────────────────────────────────────────────────────

/// Token request body for both grant types.
#[derive(Serialize)]
struct GrantRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    redirect_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Token response from the CRM's OAuth endpoint.
#[derive(Deserialize)]
struct GrantResponse {
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    token_type: String,
    /// Lifetime in seconds, relative to now
    #[serde(default)]
    expires_in: i64,
}

struct OAuthApp<'a> {
    http: &'a reqwest::Client,
    token_url: String,
    config: &'a Config,
}

impl OAuthApp<'_> {
    /// Exchange the configured one-time authorization code.
    async fn exchange_code(&self) -> Result<Token, AppError> {
        self.request_token(GrantRequest {
            client_id: &self.config.crm_client_id,
            client_secret: &self.config.crm_client_secret,
            grant_type: "authorization_code",
            redirect_uri: &self.config.crm_redirect_uri,
            code: Some(&self.config.crm_auth_code),
            refresh_token: None,
        })
        .await
    }

    /// Exchange a refresh token for a new token set.
    async fn refresh(&self, refresh_token: &str) -> Result<Token, AppError> {
        if refresh_token.is_empty() {
            return Err(AppError::Auth("No refresh token available".to_string()));
        }

        self.request_token(GrantRequest {
            client_id: &self.config.crm_client_id,
            client_secret: &self.config.crm_client_secret,
            grant_type: "refresh_token",
            redirect_uri: &self.config.crm_redirect_uri,
            code: None,
            refresh_token: Some(refresh_token),
        })
        .await
    }

    async fn request_token(&self, request: GrantRequest<'_>) -> Result<Token, AppError> {
        let grant_type = request.grant_type;
        let response = self
            .http
            .post(&self.token_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, grant_type, "CRM token request failed");
            return Err(AppError::Auth(format!(
                "Token request ({}) failed with HTTP {} ({}): {}",
                grant_type,
                status.as_u16(),
                crate::error::status_description(status.as_u16()),
                body
            )));
        }

        let parsed: GrantResponse = serde_json::from_str(&body)
            .map_err(|_| AppError::Auth("Failed to obtain access token".to_string()))?;
        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Failed to obtain access token".to_string()))?;

        tracing::info!(grant_type, expires_in = parsed.expires_in, "CRM token obtained");

        Ok(Token {
            access_token,
            refresh_token: parsed.refresh_token,
            token_type: parsed.token_type,
            expires_at: Utc::now() + ChronoDuration::seconds(parsed.expires_in),
        })
    }
}
