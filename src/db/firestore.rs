// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (account and remote link state)
//! - Contacts (synced and manually imported)
//! - Letters (metadata only)

use crate::db::{collections, contact_doc_id, UserRecordStore};
use crate::error::AppError;
use crate::models::{Contact, Letter, UserAccount, UserAccountPatch};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn query_letters_by(&self, field: &'static str, id: &str) -> Result<Vec<Letter>, AppError> {
        let id = id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LETTERS)
            .filter(move |q| q.field(field).eq(id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_error)
    }
}

fn db_error(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

#[async_trait]
impl UserRecordStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    async fn create_user(&self, user: &UserAccount) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn merge_user(&self, id: &str, patch: &UserAccountPatch) -> Result<(), AppError> {
        let fields = patch.field_paths();
        if fields.is_empty() {
            return Ok(());
        }

        // Fields in the mask but absent from the object are removed from the document.
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .document_id(id)
            .object(patch)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ─── Contact Operations ──────────────────────────────────────

    async fn list_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError> {
        let owner_id = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONTACTS)
            .filter(move |q| q.field("owner_id").eq(owner_id.clone()))
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONTACTS)
            .document_id(contact_doc_id(&contact.owner_id, &contact.id))
            .object(contact)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_contact(&self, owner_id: &str, contact_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CONTACTS)
            .document_id(contact_doc_id(owner_id, contact_id))
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ─── Letter Operations ───────────────────────────────────────

    async fn create_letter(&self, letter: &Letter) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LETTERS)
            .document_id(&letter.id)
            .object(letter)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn get_letter(&self, id: &str) -> Result<Option<Letter>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LETTERS)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    async fn list_letters_sent(&self, sender_id: &str) -> Result<Vec<Letter>, AppError> {
        self.query_letters_by("sender_id", sender_id).await
    }

    async fn list_letters_received(
        &self,
        recipient_ids: &[String],
    ) -> Result<Vec<Letter>, AppError> {
        // At most two ids (account id and remote user id), so one query each.
        let mut letters: Vec<Letter> = Vec::new();
        for recipient_id in recipient_ids {
            for letter in self.query_letters_by("recipient_id", recipient_id).await? {
                if !letters.iter().any(|l| l.id == letter.id) {
                    letters.push(letter);
                }
            }
        }

        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }
}
