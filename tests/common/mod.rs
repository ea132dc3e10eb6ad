// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use letter_exchange::config::{Config, RemoteConfig};
use letter_exchange::db::{FirestoreDb, InMemoryStore, UserRecordStore};
use letter_exchange::routes::create_router;
use letter_exchange::services::{Clock, LinkingService, RemoteAccountClient};
use letter_exchange::AppState;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Clock pinned to a settable instant.
#[allow(dead_code)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

#[allow(dead_code)]
impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

// ─── Mock remote account service ─────────────────────────────────────────────

/// A request the mock remote received.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path without the `/api/dev` prefix, e.g. `/token`
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local HTTP server standing in for the remote account service.
///
/// Responses are queued per path; the last queued response for a path keeps
/// being served once the others are used up.
#[allow(dead_code)]
pub struct MockRemote {
    pub base_url: String,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockRemote {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(mock_handler).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock remote");
        let addr = listener.local_addr().expect("mock remote address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock remote server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Queue a response for `path` (e.g. `/signin`).
    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.into()));
    }

    pub fn respond_json(&self, path: &str, body: serde_json::Value) {
        self.respond(path, 200, body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Complete remote settings pointing at this server.
    pub fn config(&self) -> RemoteConfig {
        RemoteConfig {
            app_id: Some("app-123".to_string()),
            api_key: Some("key-456".to_string()),
            host: Some(self.base_url.clone()),
        }
    }
}

async fn mock_handler(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().clone();
    let headers = request.headers().clone();
    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map(|b| String::from_utf8_lossy(&b).to_string())
        .unwrap_or_default();

    let path = uri
        .path()
        .strip_prefix("/api/dev")
        .unwrap_or(uri.path())
        .to_string();

    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    let next = {
        let mut responses = state.responses.lock().unwrap();
        responses.get_mut(&path).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    match next {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(body),
        )
            .into_response(),
        None => (StatusCode::NOT_IMPLEMENTED, "no mock response queued").into_response(),
    }
}

// ─── App setup ───────────────────────────────────────────────────────────────

/// Linking service over an in-memory store, talking to `remote`.
#[allow(dead_code)]
pub fn linking_service(
    remote: &RemoteConfig,
    store: &InMemoryStore,
    clock: Arc<dyn Clock>,
) -> LinkingService {
    let store: Arc<dyn UserRecordStore> = Arc::new(store.clone());
    LinkingService::with_clock(RemoteAccountClient::new(remote), store, clock)
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app(config: Config) -> (axum::Router, Arc<AppState>, InMemoryStore) {
    let store = InMemoryStore::new();
    let shared: Arc<dyn UserRecordStore> = Arc::new(store.clone());
    let linking = LinkingService::new(RemoteAccountClient::new(&config.remote), shared.clone());

    let state = Arc::new(AppState {
        config,
        store: shared,
        linking,
    });

    (create_router(state.clone()), state, store)
}

/// Session token for `user_id`, signed like the identity provider would.
#[allow(dead_code)]
pub fn session_token(config: &Config, user_id: &str, email: Option<&str>) -> String {
    letter_exchange::middleware::auth::create_jwt(user_id, email, &config.jwt_signing_key)
        .expect("create session token")
}
