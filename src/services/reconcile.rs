// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact reconciliation.
//!
//! The remote contact list is authoritative. A pass deletes every local
//! contact of the owner, waits for all deletes to settle, then upserts one row
//! per remote contact keyed by its remote id.

use crate::db::UserRecordStore;
use crate::error::AppError;
use crate::models::{Contact, ContactSource};
use crate::services::remote::RemoteProfile;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReconcileReport {
    pub deleted: usize,
    pub upserted: usize,
    /// Cursor for the next remote page, if the remote has more.
    pub next_cursor: Option<String>,
}

/// Replaces an owner's local contacts with a remote list.
#[derive(Clone)]
pub struct ContactReconciler {
    store: Arc<dyn UserRecordStore>,
}

impl ContactReconciler {
    pub fn new(store: Arc<dyn UserRecordStore>) -> Self {
        Self { store }
    }

    /// Make `owner_id`'s local contacts exactly `remote`.
    ///
    /// If any delete fails the insert phase is skipped and the first error is
    /// returned; rows already deleted stay deleted until the next pass.
    pub async fn reconcile(
        &self,
        owner_id: &str,
        remote: &[RemoteProfile],
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport, AppError> {
        let existing = self.store.list_contacts(owner_id).await?;

        // Delete phase: fully settled before any insert starts.
        let delete_results = stream::iter(existing.into_iter().map(|c| c.id))
            .map(|contact_id| {
                let store = self.store.clone();
                let owner_id = owner_id.to_string();
                async move { store.delete_contact(&owner_id, &contact_id).await }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await;

        let attempted = delete_results.len();
        let mut failures = delete_results.into_iter().filter_map(Result::err);
        if let Some(first) = failures.next() {
            let failed = 1 + failures.count();
            tracing::warn!(
                owner_id,
                attempted,
                failed,
                "Contact delete phase partially failed, skipping inserts"
            );
            return Err(first);
        }

        // Insert phase: distinct keys, so order does not matter.
        let rows: Vec<Contact> = remote
            .iter()
            .map(|profile| contact_from_remote(owner_id, profile, now))
            .collect();

        stream::iter(rows.clone())
            .map(|contact| {
                let store = self.store.clone();
                async move { store.upsert_contact(&contact).await }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(
            owner_id,
            deleted = attempted,
            upserted = rows.len(),
            "Contacts reconciled"
        );

        Ok(ReconcileReport {
            deleted: attempted,
            upserted: rows.len(),
            next_cursor: None,
        })
    }
}

/// Local row for a remote contact, profile fields copied verbatim.
fn contact_from_remote(owner_id: &str, profile: &RemoteProfile, now: DateTime<Utc>) -> Contact {
    Contact {
        id: profile.user_id.clone(),
        owner_id: owner_id.to_string(),
        display_name: profile.name.clone(),
        handle: profile.handle.clone(),
        photo_url: profile.photo_url.clone(),
        source: ContactSource::Remote,
        source_app_id: None,
        updated_at: now,
    }
}
