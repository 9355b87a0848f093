// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRM client tests against a mock CRM.
//!
//! These tests verify that:
//! 1. A valid stored token is reused without touching the OAuth endpoint
//! 2. Expired tokens go through the refresh grant, missing ones through
//!    the authorization-code grant, and fresh tokens are persisted
//! 3. Bulk listings walk pages 1, 2, ... and stop on the first empty page
//! 4. Non-2xx responses surface with their status and description

use crm_sheets_report::error::AppError;
use crm_sheets_report::services::crm::{CrmClient, QueryParams};
use crm_sheets_report::services::{CredentialStore, MemoryCredentialStore};
use httpmock::prelude::*;
use reqwest::Method as HttpMethod;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;
use common::{expired_token, seeded_store, test_config};

fn token_response(access: &str) -> serde_json::Value {
    json!({
        "token_type": "Bearer",
        "expires_in": 86400,
        "access_token": access,
        "refresh_token": "next-refresh"
    })
}

#[tokio::test]
async fn test_valid_token_makes_no_auth_calls() {
    let crm = MockServer::start();
    let sheets = MockServer::start();
    let oauth = crm.mock(|when, then| {
        when.method(POST).path("/oauth2/access_token");
        then.status(200).json_body(token_response("unexpected"));
    });
    let leads = crm.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/leads")
            .header("authorization", "Bearer stored-access");
        then.status(200).json_body(json!({"_embedded": {"leads": []}}));
    });

    let store = seeded_store();
    let client = CrmClient::connect(&test_config(&crm, &sheets), store.clone())
        .await
        .expect("connect with stored token");
    client.get("leads", &QueryParams::new()).await.unwrap();

    assert_eq!(oauth.calls(), 0);
    assert_eq!(leads.calls(), 1);
}

#[tokio::test]
async fn test_expired_token_uses_refresh_grant() {
    let crm = MockServer::start();
    let sheets = MockServer::start();
    let config = test_config(&crm, &sheets);

    let refresh = crm.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/access_token")
            .json_body(json!({
                "client_id": "test_client_id",
                "client_secret": "test_secret",
                "grant_type": "refresh_token",
                "redirect_uri": "https://example.com/oauth",
                "refresh_token": "stored-refresh"
            }));
        then.status(200).json_body(token_response("refreshed-access"));
    });
    let code_grant = crm.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/access_token")
            .json_body(json!({
                "client_id": "test_client_id",
                "client_secret": "test_secret",
                "grant_type": "authorization_code",
                "redirect_uri": "https://example.com/oauth",
                "code": "test_auth_code"
            }));
        then.status(200).json_body(token_response("unexpected"));
    });
    let leads = crm.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/leads")
            .header("authorization", "Bearer refreshed-access");
        then.status(200).json_body(json!({}));
    });

    let store = Arc::new(MemoryCredentialStore::new(Some(expired_token())));
    let client = CrmClient::connect(&config, store.clone())
        .await
        .expect("refresh should succeed");
    client.get("leads", &QueryParams::new()).await.unwrap();

    assert_eq!(refresh.calls(), 1);
    assert_eq!(code_grant.calls(), 0);
    assert_eq!(leads.calls(), 1);

    let saved = store.load().expect("refreshed token persisted");
    assert_eq!(saved.access_token, "refreshed-access");
    assert_eq!(saved.refresh_token, "next-refresh");
    assert!(saved.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn test_missing_token_uses_authorization_code() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let code_grant = crm.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/access_token")
            .json_body(json!({
                "client_id": "test_client_id",
                "client_secret": "test_secret",
                "grant_type": "authorization_code",
                "redirect_uri": "https://example.com/oauth",
                "code": "test_auth_code"
            }));
        then.status(200).json_body(token_response("first-access"));
    });

    let store = Arc::new(MemoryCredentialStore::default());
    CrmClient::connect(&test_config(&crm, &sheets), store.clone())
        .await
        .expect("code exchange should succeed");

    assert_eq!(code_grant.calls(), 1);
    assert_eq!(store.load().unwrap().access_token, "first-access");
}

#[tokio::test]
async fn test_rejected_refresh_is_auth_error() {
    let crm = MockServer::start();
    let sheets = MockServer::start();
    let refresh = crm.mock(|when, then| {
        when.method(POST).path("/oauth2/access_token");
        then.status(400)
            .json_body(json!({"hint": "Token has been revoked"}));
    });

    let store = Arc::new(MemoryCredentialStore::new(Some(expired_token())));
    let result = CrmClient::connect(&test_config(&crm, &sheets), store.clone()).await;

    match result {
        Err(AppError::Auth(msg)) => assert!(msg.contains("revoked"), "got {}", msg),
        Err(e) => panic!("expected auth error, got {}", e),
        Ok(_) => panic!("expected auth error, got a client"),
    }
    assert_eq!(refresh.calls(), 1);
    assert_eq!(store.load().unwrap().access_token, "stored-access");
}

#[tokio::test]
async fn test_token_response_without_access_token_is_auth_error() {
    let crm = MockServer::start();
    let sheets = MockServer::start();
    crm.mock(|when, then| {
        when.method(POST).path("/oauth2/access_token");
        then.status(200).json_body(json!({"token_type": "Bearer"}));
    });

    let store = Arc::new(MemoryCredentialStore::default());
    let result = CrmClient::connect(&test_config(&crm, &sheets), store.clone()).await;

    assert!(matches!(result, Err(AppError::Auth(ref msg)) if msg == "Failed to obtain access token"));
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_expired_token_without_refresh_token_fails_offline() {
    let crm = MockServer::start();
    let sheets = MockServer::start();
    let oauth = crm.mock(|when, then| {
        when.method(POST).path("/oauth2/access_token");
        then.status(200).json_body(token_response("unexpected"));
    });

    let mut token = expired_token();
    token.refresh_token.clear();
    let store = Arc::new(MemoryCredentialStore::new(Some(token)));
    let result = CrmClient::connect(&test_config(&crm, &sheets), store).await;

    assert!(matches!(result, Err(AppError::Auth(ref msg)) if msg == "No refresh token available"));
    assert_eq!(oauth.calls(), 0);
}

#[tokio::test]
async fn test_get_all_walks_pages_until_empty() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let page1 = crm.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/events")
            .query_param("page", "1")
            .query_param("limit", "250")
            .query_param("with", "leads,contacts");
        then.status(200)
            .json_body(json!({"_embedded": {"events": [{"id": "a"}, {"id": "b"}]}}));
    });
    let page2 = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/events").query_param("page", "2");
        then.status(200)
            .json_body(json!({"_embedded": {"events": [{"id": "c"}]}}));
    });
    let page3 = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/events").query_param("page", "3");
        then.status(200).json_body(json!({"_embedded": {"events": []}}));
    });
    let page4 = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/events").query_param("page", "4");
        then.status(200)
            .json_body(json!({"_embedded": {"events": [{"id": "never"}]}}));
    });

    let client = CrmClient::connect(&test_config(&crm, &sheets), seeded_store())
        .await
        .unwrap();
    let items = client.get_all("events", None).await.unwrap();

    let ids: Vec<&str> = items.iter().filter_map(|i| i["id"].as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(page1.calls(), 1);
    assert_eq!(page2.calls(), 1);
    assert_eq!(page3.calls(), 1);
    assert_eq!(page4.calls(), 0);
}

#[tokio::test]
async fn test_get_all_stops_on_no_content() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "1");
        then.status(200)
            .json_body(json!({"_embedded": {"users": [{"id": 1}]}}));
    });
    let page2 = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "2");
        then.status(204);
    });

    let client = CrmClient::connect(&test_config(&crm, &sheets), seeded_store())
        .await
        .unwrap();
    let users = client.get_all("users", None).await.unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(page2.calls(), 1);
}

#[tokio::test]
async fn test_get_all_caller_params_override_defaults() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let page1 = crm.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/leads")
            .query_param("page", "1")
            .query_param("limit", "50")
            .query_param("with", "catalog_elements");
        then.status(200).json_body(json!({"_embedded": {"leads": []}}));
    });

    let client = CrmClient::connect(&test_config(&crm, &sheets), seeded_store())
        .await
        .unwrap();
    let extra = QueryParams::from([
        ("limit".to_string(), "50".to_string()),
        ("with".to_string(), "catalog_elements".to_string()),
    ]);
    let leads = client.get_all("leads", Some(extra)).await.unwrap();

    assert!(leads.is_empty());
    assert_eq!(page1.calls(), 1);
}

#[tokio::test]
async fn test_get_all_pauses_between_pages() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "1");
        then.status(200).json_body(json!({"_embedded": {"users": [{"id": 1}]}}));
    });
    crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "2");
        then.status(200).json_body(json!({"_embedded": {"users": [{"id": 2}]}}));
    });
    let last = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "3");
        then.status(204);
    });

    let delay = Duration::from_millis(40);
    let config = crm_sheets_report::config::Config {
        page_delay: delay,
        ..test_config(&crm, &sheets)
    };
    let client = CrmClient::connect(&config, seeded_store()).await.unwrap();

    let started = Instant::now();
    let items = client.get_all("users", None).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(items.len(), 2);
    assert_eq!(last.calls(), 1);
    // Pages 2 and 3 each wait once
    assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_get_all_first_page_is_not_delayed() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let first = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/users").query_param("page", "1");
        then.status(204);
    });

    let delay = Duration::from_secs(5);
    let config = crm_sheets_report::config::Config {
        page_delay: delay,
        ..test_config(&crm, &sheets)
    };
    let client = CrmClient::connect(&config, seeded_store()).await.unwrap();

    let started = Instant::now();
    let items = client.get_all("users", None).await.unwrap();

    assert!(items.is_empty());
    assert_eq!(first.calls(), 1);
    assert!(started.elapsed() < delay, "first page waited");
}

#[tokio::test]
async fn test_get_all_enforces_page_cap() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let endless = crm.mock(|when, then| {
        when.method(GET).path("/api/v4/contacts");
        then.status(200)
            .json_body(json!({"_embedded": {"contacts": [{"id": 1}]}}));
    });

    let config = crm_sheets_report::config::Config {
        max_pages: 3,
        ..test_config(&crm, &sheets)
    };
    let client = CrmClient::connect(&config, seeded_store()).await.unwrap();
    let result = client.get_all("contacts", None).await;

    match result {
        Err(AppError::PaginationLimitExceeded { entity, max_pages }) => {
            assert_eq!(entity, "contacts");
            assert_eq!(max_pages, 3);
        }
        other => panic!("expected pagination limit error, got {:?}", other.map(|v| v.len())),
    }
    assert_eq!(endless.calls(), 3);
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    crm.mock(|when, then| {
        when.method(GET).path("/api/v4/leads/999");
        then.status(404).body("{\"title\":\"Not Found\"}");
    });

    let client = CrmClient::connect(&test_config(&crm, &sheets), seeded_store())
        .await
        .unwrap();
    let err = client
        .get("leads/999", &QueryParams::new())
        .await
        .expect_err("404 should fail");

    match &err {
        AppError::Api {
            status,
            message,
            body,
        } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "Not found");
            assert!(body.contains("Not Found"));
        }
        other => panic!("expected API error, got {}", other),
    }
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn test_post_and_patch_send_json_bodies() {
    let crm = MockServer::start();
    let sheets = MockServer::start();

    let create = crm.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/leads")
            .header("authorization", "Bearer stored-access")
            .json_body(json!([{"name": "Новая сделка"}]));
        then.status(200)
            .json_body(json!({"_embedded": {"leads": [{"id": 10}]}}));
    });
    let update = crm.mock(|when, then| {
        when.method(PATCH)
            .path("/api/v4/leads/10")
            .json_body(json!({"price": 5000}));
        then.status(200).json_body(json!({"id": 10}));
    });

    let client = CrmClient::connect(&test_config(&crm, &sheets), seeded_store())
        .await
        .unwrap();

    let created = client
        .post("leads", &json!([{"name": "Новая сделка"}]), HttpMethod::POST)
        .await
        .unwrap();
    assert_eq!(created["_embedded"]["leads"][0]["id"], 10);

    let updated = client
        .post("leads/10", &json!({"price": 5000}), HttpMethod::PATCH)
        .await
        .unwrap();
    assert_eq!(updated["id"], 10);

    let rejected = client
        .post("leads/10", &json!({}), HttpMethod::DELETE)
        .await;
    assert!(matches!(rejected, Err(AppError::Internal(_))));

    assert_eq!(create.calls(), 1);
    assert_eq!(update.calls(), 1);
}
