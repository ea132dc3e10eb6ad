// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory record store.
//!
//! Backs the test suite and `STORE=memory` local runs where no Firestore
//! emulator is available. Behaves like the Firestore store, including merge
//! semantics for account patches.

use crate::db::{contact_doc_id, UserRecordStore};
use crate::error::AppError;
use crate::models::{Contact, Letter, UserAccount, UserAccountPatch};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    users: Arc<DashMap<String, UserAccount>>,
    contacts: Arc<DashMap<String, Contact>>,
    letters: Arc<DashMap<String, Letter>>,
    user_writes: Arc<AtomicUsize>,
    fail_contact_deletes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of account writes (creates and merges) so far.
    pub fn user_writes(&self) -> usize {
        self.user_writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent contact delete fail, to exercise partial reconciliation.
    pub fn set_fail_contact_deletes(&self, fail: bool) {
        self.fail_contact_deletes.store(fail, Ordering::SeqCst);
    }

    /// Total contacts across all owners.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

#[async_trait]
impl UserRecordStore for InMemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn create_user(&self, user: &UserAccount) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        self.user_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn merge_user(&self, id: &str, patch: &UserAccountPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut entry = self
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;
        patch.apply_to(&mut entry);
        self.user_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError> {
        Ok(self
            .contacts
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .map(|c| c.clone())
            .collect())
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError> {
        self.contacts.insert(
            contact_doc_id(&contact.owner_id, &contact.id),
            contact.clone(),
        );
        Ok(())
    }

    async fn delete_contact(&self, owner_id: &str, contact_id: &str) -> Result<(), AppError> {
        if self.fail_contact_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Database(format!(
                "delete of contact {} failed",
                contact_id
            )));
        }
        self.contacts.remove(&contact_doc_id(owner_id, contact_id));
        Ok(())
    }

    async fn create_letter(&self, letter: &Letter) -> Result<(), AppError> {
        self.letters.insert(letter.id.clone(), letter.clone());
        Ok(())
    }

    async fn get_letter(&self, id: &str) -> Result<Option<Letter>, AppError> {
        Ok(self.letters.get(id).map(|l| l.clone()))
    }

    async fn list_letters_sent(&self, sender_id: &str) -> Result<Vec<Letter>, AppError> {
        let mut letters: Vec<Letter> = self
            .letters
            .iter()
            .filter(|l| l.sender_id == sender_id)
            .map(|l| l.clone())
            .collect();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }

    async fn list_letters_received(
        &self,
        recipient_ids: &[String],
    ) -> Result<Vec<Letter>, AppError> {
        let mut letters: Vec<Letter> = self
            .letters
            .iter()
            .filter(|l| recipient_ids.contains(&l.recipient_id))
            .map(|l| l.clone())
            .collect();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }
}
