// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and remote-link routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{LinkState, UserAccount};
use crate::services::{ContactQuery, ReconcileReport, TokenStatus};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::SecondsFormat;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", post(start_session))
        .route("/api/me", get(get_me))
        .route("/api/link", post(relink))
        .route("/api/link/token", post(exchange_token))
        .route("/api/link/connect", post(connect))
        .route("/api/contacts/refresh", post(refresh_contacts))
}

/// Account view. Tokens never leave the server.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountResponse {
    pub id: String,
    pub email: Option<String>,
    pub link_state: LinkState,
    pub remote_user_id: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// RFC3339 with a `Z` suffix
    pub bearer_token_expires_at: Option<String>,
}

impl AccountResponse {
    fn from_account(account: &UserAccount, link_state: LinkState) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            link_state,
            remote_user_id: account.remote_user_id.clone(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
            bearer_token_expires_at: account
                .bearer_token_expires_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

fn account_view(state: &AppState, account: &UserAccount) -> Json<AccountResponse> {
    let link_state = account.link_state(state.linking.now());
    Json(AccountResponse::from_account(account, link_state))
}

async fn load_account(state: &AppState, user: &AuthUser) -> Result<UserAccount> {
    state
        .store
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))
}

/// Record a sign-in: creates the account on first visit and requests a
/// remote link when possible.
async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AccountResponse>> {
    tracing::info!(user_id = %user.user_id, "Session started");

    let account = state
        .linking
        .complete_sign_in(&user.user_id, user.email.clone())
        .await?;

    Ok(account_view(&state, &account))
}

/// Get current account with its link state.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AccountResponse>> {
    let account = load_account(&state, &user).await?;
    Ok(account_view(&state, &account))
}

/// Explicitly re-link: request a fresh login-request token.
async fn relink(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AccountResponse>> {
    let account = load_account(&state, &user).await?;
    let account = state.linking.relink(account).await?;
    Ok(account_view(&state, &account))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenExchangeResponse {
    pub status: TokenStatus,
    pub account: AccountResponse,
}

/// Exchange the login-request token; reports `pending` or `active`.
async fn exchange_token(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TokenExchangeResponse>> {
    let account = load_account(&state, &user).await?;
    let (account, status) = state.linking.exchange_token(account).await?;

    let Json(account) = account_view(&state, &account);
    Ok(Json(TokenExchangeResponse { status, account }))
}

/// Fetch the remote profile onto the account.
async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AccountResponse>> {
    let account = load_account(&state, &user).await?;
    let account = state.linking.connect(account).await?;
    Ok(account_view(&state, &account))
}

/// Replace the local contact list with the remote one.
async fn refresh_contacts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ContactQuery>,
) -> Result<Json<ReconcileReport>> {
    tracing::debug!(
        user_id = %user.user_id,
        search = ?query.search_term,
        cursor = ?query.cursor,
        "Refreshing contacts"
    );

    let account = load_account(&state, &user).await?;
    let (_, report) = state.linking.refresh_contacts(account, &query).await?;
    Ok(Json(report))
}
