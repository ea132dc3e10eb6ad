// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Letter metadata routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Letter;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/letters", post(create_letter))
        .route("/api/letters/sent", get(list_sent))
        .route("/api/letters/received", get(list_received))
        .route("/api/letters/{id}", get(get_letter))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LettersResponse {
    pub letters: Vec<Letter>,
}

/// New letter. The file is already in the object store; `image_url` points at it.
#[derive(Deserialize, Validate)]
pub struct CreateLetterRequest {
    #[validate(length(min = 1))]
    pub recipient_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(url)]
    pub image_url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub thumbnail_url: Option<String>,
}

/// Ids the caller may appear under as a recipient: the account id, and the
/// remote user id once connected.
async fn recipient_ids(state: &AppState, user: &AuthUser) -> Result<Vec<String>> {
    let mut ids = vec![user.user_id.clone()];
    if let Some(remote_id) = state
        .store
        .get_user(&user.user_id)
        .await?
        .and_then(|account| account.remote_user_id)
    {
        if !ids.contains(&remote_id) {
            ids.push(remote_id);
        }
    }
    Ok(ids)
}

async fn create_letter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateLetterRequest>,
) -> Result<Json<Letter>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let letter = Letter {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: user.user_id.clone(),
        recipient_id: payload.recipient_id,
        description: payload.description,
        image_url: payload.image_url,
        file_type: payload.file_type,
        file_name: payload.file_name,
        thumbnail_url: payload.thumbnail_url,
        created_at: state.linking.now(),
    };
    state.store.create_letter(&letter).await?;

    tracing::info!(
        user_id = %user.user_id,
        letter_id = %letter.id,
        recipient_id = %letter.recipient_id,
        "Letter created"
    );

    Ok(Json(letter))
}

async fn list_sent(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LettersResponse>> {
    let letters = state.store.list_letters_sent(&user.user_id).await?;
    Ok(Json(LettersResponse { letters }))
}

async fn list_received(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LettersResponse>> {
    let ids = recipient_ids(&state, &user).await?;
    let letters = state.store.list_letters_received(&ids).await?;
    Ok(Json(LettersResponse { letters }))
}

/// A single letter, visible to its sender and recipient only.
async fn get_letter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Letter>> {
    let not_found = || AppError::NotFound(format!("Letter {} not found", id));

    let letter = state.store.get_letter(&id).await?.ok_or_else(not_found)?;

    let ids = recipient_ids(&state, &user).await?;
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    if !letter.is_visible_to(&ids) {
        return Err(not_found());
    }

    Ok(Json(letter))
}
