// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API route tests over the in-memory store.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Session, link and contact routes map service outcomes to status codes
//! 3. Letters are only visible to their sender and recipient

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use letter_exchange::config::{Config, RemoteConfig};
use letter_exchange::db::UserRecordStore;
use letter_exchange::models::UserAccount;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, session_token, MockRemote};

fn unconfigured() -> Config {
    Config {
        remote: RemoteConfig::default(),
        ..Config::default()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// AUTH AND CORS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = create_test_app(unconfigured());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = create_test_app(unconfigured());

    let (status, _) = send(&app, get("/api/contacts", "invalid.token.here")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());

    let other = Config {
        jwt_signing_key: b"some_other_key_that_is_long_enough".to_vec(),
        ..config
    };
    let token = session_token(&other, "u1", None);

    let (status, _) = send(&app, get("/api/contacts", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", None);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/contacts")
                .header(header::COOKIE, format!("letterbox_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = create_test_app(unconfigured());

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/contacts")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_health_reports_remote_configuration() {
    let (app, _, _) = create_test_app(unconfigured());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["remote_configured"], false);
}

// ═══════════════════════════════════════════════════════════════════════════
// SESSION AND LINKING
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_me_before_session_is_not_found() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    let (status, body) = send(&app, get("/api/me", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_session_with_unconfigured_remote() {
    let config = unconfigured();
    let (app, _, store) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    let (status, body) = send(&app, post("/api/session", &token, json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "remote_unconfigured");

    // The account exists anyway, just unlinked.
    let (status, body) = send(&app, get("/api/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["link_state"], "unlinked");
    assert_eq!(body["email"], "ann@example.com");
    assert!(store.get_user("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_session_links_account() {
    let remote = MockRemote::start().await;
    remote.respond_json("/signin", json!({ "loginRequestToken": "T" }));
    let config = Config {
        remote: remote.config(),
        ..Config::default()
    };
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    let (status, body) = send(&app, post("/api/session", &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "u1");
    assert_eq!(body["link_state"], "link_requested");
    // Tokens stay on the server.
    assert!(body.get("login_request_token").is_none());
    assert!(body.get("bearer_token").is_none());

    let (status, _) = send(&app, post("/api/session", &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remote.requests_to("/signin").len(), 1);
}

#[tokio::test]
async fn test_token_exchange_reports_pending() {
    let remote = MockRemote::start().await;
    remote.respond_json("/signin", json!({ "loginRequestToken": "T" }));
    remote.respond_json("/token", json!({ "pending": true }));
    let config = Config {
        remote: remote.config(),
        ..Config::default()
    };
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    send(&app, post("/api/session", &token, json!({}))).await;

    let (status, body) = send(&app, post("/api/link/token", &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["account"]["link_state"], "link_requested");

    // Refreshing contacts needs an active token.
    let (status, body) = send(&app, post("/api/contacts/refresh", &token, json!({}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["error"], "pending_verification");
}

#[tokio::test]
async fn test_token_exchange_on_unlinked_account_conflicts() {
    let config = unconfigured();
    let (app, _, store) = create_test_app(config.clone());
    store
        .create_user(&UserAccount::new("u1", None, Utc::now()))
        .await
        .unwrap();
    let token = session_token(&config, "u1", None);

    let (status, body) = send(&app, post("/api/link/token", &token, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "precondition_failed");
}

#[tokio::test]
async fn test_rejected_bearer_token_asks_for_reconnect() {
    let remote = MockRemote::start().await;
    remote.respond_json("/signin", json!({ "loginRequestToken": "T" }));
    remote.respond_json("/token", json!({ "pending": false, "token": "B" }));
    remote.respond("/me", 401, "{\"error\":\"expired\"}");
    let config = Config {
        remote: remote.config(),
        ..Config::default()
    };
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    send(&app, post("/api/session", &token, json!({}))).await;

    let (status, body) = send(&app, post("/api/link/connect", &token, json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "reconnect_required");
}

#[tokio::test]
async fn test_contact_refresh_passes_query_through() {
    let remote = MockRemote::start().await;
    remote.respond_json("/signin", json!({ "loginRequestToken": "T" }));
    remote.respond_json("/token", json!({ "pending": false, "token": "B" }));
    remote.respond_json(
        "/socialgraph/followed",
        json!({
            "list": [ { "user": { "userId": "r1", "name": "Zed" } } ],
            "nextPage": "n2"
        }),
    );
    let config = Config {
        remote: remote.config(),
        ..Config::default()
    };
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", Some("ann@example.com"));

    send(&app, post("/api/session", &token, json!({}))).await;

    let (status, body) = send(
        &app,
        post("/api/contacts/refresh?search=ze&cursor=n1", &token, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upserted"], 1);
    assert_eq!(body["next_cursor"], "n2");

    let followed = remote.requests_to("/socialgraph/followed");
    assert_eq!(followed[0].query.as_deref(), Some("searchStr=ze&nextId=n1"));

    let (_, body) = send(&app, get("/api/contacts", &token)).await;
    assert_eq!(body["contacts"][0]["id"], "r1");
    assert_eq!(body["contacts"][0]["source"], "remote");
}

// ═══════════════════════════════════════════════════════════════════════════
// CONTACTS AND LETTERS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_import_and_list_contacts() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "u1", None);

    for name in ["bob", "Alice"] {
        let (status, body) = send(
            &app,
            post(
                "/api/contacts",
                &token,
                json!({ "display_name": name, "source_app_id": "phone" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "manual");
        assert_eq!(body["owner_id"], "u1");
    }

    let (status, body) = send(&app, get("/api/contacts", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["contacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "bob"]);

    // Other users see nothing.
    let other = session_token(&config, "u2", None);
    let (_, body) = send(&app, get("/api/contacts", &other)).await;
    assert!(body["contacts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_import_contact_validation() {
    let config = unconfigured();
    let (app, _, store) = create_test_app(config.clone());
    let token = session_token(&config, "u1", None);

    let (status, body) = send(
        &app,
        post(
            "/api/contacts",
            &token,
            json!({ "display_name": "", "source_app_id": "phone" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(store.contact_count(), 0);
}

#[tokio::test]
async fn test_letters_sent_and_received() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());
    let sender = session_token(&config, "alice", None);
    let recipient = session_token(&config, "bob", None);
    let stranger = session_token(&config, "carol", None);

    let (status, letter) = send(
        &app,
        post(
            "/api/letters",
            &sender,
            json!({
                "recipient_id": "bob",
                "description": "Postcard from the coast",
                "image_url": "https://storage.example/letters/1.jpg",
                "file_type": "image/jpeg"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = letter["id"].as_str().unwrap().to_string();
    assert_eq!(letter["sender_id"], "alice");

    let (_, sent) = send(&app, get("/api/letters/sent", &sender)).await;
    assert_eq!(sent["letters"].as_array().unwrap().len(), 1);

    let (_, received) = send(&app, get("/api/letters/received", &recipient)).await;
    assert_eq!(received["letters"][0]["id"], id.as_str());

    let uri = format!("/api/letters/{}", id);
    let (status, _) = send(&app, get(&uri, &recipient)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get(&uri, &sender)).await;
    assert_eq!(status, StatusCode::OK);

    // Existence is not revealed to anyone else.
    let (status, _) = send(&app, get(&uri, &stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/letters/missing", &sender)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_letter_to_remote_user_id_is_received() {
    let config = unconfigured();
    let (app, _, store) = create_test_app(config.clone());
    let mut bob = UserAccount::new("bob", None, Utc::now());
    bob.remote_user_id = Some("remote-bob".to_string());
    store.create_user(&bob).await.unwrap();

    let sender = session_token(&config, "alice", None);
    let (status, _) = send(
        &app,
        post(
            "/api/letters",
            &sender,
            json!({
                "recipient_id": "remote-bob",
                "description": "Hello",
                "image_url": "https://storage.example/letters/2.jpg"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let recipient = session_token(&config, "bob", None);
    let (_, received) = send(&app, get("/api/letters/received", &recipient)).await;
    assert_eq!(received["letters"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_letter_validation() {
    let config = unconfigured();
    let (app, _, _) = create_test_app(config.clone());
    let token = session_token(&config, "alice", None);

    let (status, _) = send(
        &app,
        post(
            "/api/letters",
            &token,
            json!({
                "recipient_id": "bob",
                "description": "Hi",
                "image_url": "not a url"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
