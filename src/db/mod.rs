//! Database layer (Firestore, plus an in-memory store for tests and offline runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryStore;

use crate::error::AppError;
use crate::models::{Contact, Letter, UserAccount, UserAccountPatch};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Contacts, keyed by `{owner_id}_{contact_id}` rather than the bare remote
    /// id, so owners following the same person keep separate rows
    pub const CONTACTS: &str = "contacts";
    pub const LETTERS: &str = "letters";
}

/// Document ID for a contact row.
///
/// The contact id alone is unique per owner only; prefixing the owner keeps two
/// users who follow the same remote person from overwriting each other.
pub fn contact_doc_id(owner_id: &str, contact_id: &str) -> String {
    format!("{}_{}", owner_id, contact_id)
}

/// User accounts, contacts and letters as seen by the services.
///
/// Writes are last-write-wins; there is no optimistic concurrency control.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, AppError>;

    /// Write a full account document (first sign-in).
    async fn create_user(&self, user: &UserAccount) -> Result<(), AppError>;

    /// Merge `patch` into the stored account; fields not in the patch stay as they are.
    async fn merge_user(&self, id: &str, patch: &UserAccountPatch) -> Result<(), AppError>;

    /// All contacts owned by `owner_id`.
    async fn list_contacts(&self, owner_id: &str) -> Result<Vec<Contact>, AppError>;

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), AppError>;

    async fn delete_contact(&self, owner_id: &str, contact_id: &str) -> Result<(), AppError>;

    async fn create_letter(&self, letter: &Letter) -> Result<(), AppError>;

    async fn get_letter(&self, id: &str) -> Result<Option<Letter>, AppError>;

    /// Letters sent by `sender_id`, newest first.
    async fn list_letters_sent(&self, sender_id: &str) -> Result<Vec<Letter>, AppError>;

    /// Letters addressed to any of `recipient_ids`, newest first.
    async fn list_letters_received(
        &self,
        recipient_ids: &[String],
    ) -> Result<Vec<Letter>, AppError>;
}
