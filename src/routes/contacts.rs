// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact listing and manual import.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Contact, ContactSource};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/contacts", get(list_contacts).post(import_contact))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
}

/// List the caller's contacts, sorted by name.
async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ContactsResponse>> {
    let mut contacts = state.store.list_contacts(&user.user_id).await?;
    contacts.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(Json(ContactsResponse { contacts }))
}

#[derive(Deserialize, Validate)]
pub struct ImportContactRequest {
    #[validate(length(min = 1, max = 200))]
    pub display_name: String,
    /// Where the contact came from (free-form, e.g. an app name)
    #[validate(length(min = 1, max = 100))]
    pub source_app_id: String,
}

/// Add a contact by hand.
///
/// Manual contacts share the owner's contact set, so the next remote refresh
/// replaces them along with everything else.
async fn import_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ImportContactRequest>,
) -> Result<Json<Contact>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let contact = Contact {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: user.user_id.clone(),
        display_name: payload.display_name.trim().to_string(),
        handle: None,
        photo_url: None,
        source: ContactSource::Manual,
        source_app_id: Some(payload.source_app_id),
        updated_at: state.linking.now(),
    };
    state.store.upsert_contact(&contact).await?;

    tracing::info!(
        user_id = %user.user_id,
        contact_id = %contact.id,
        "Contact imported"
    );

    Ok(Json(contact))
}
