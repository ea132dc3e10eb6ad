// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Letter metadata model. The scanned image or PDF itself lives in the
//! object store; only its download URL is kept here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Letter record stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Letter {
    /// Generated document ID
    pub id: String,
    /// Sending account id
    pub sender_id: String,
    /// Recipient contact id (a remote user id for synced contacts)
    pub recipient_id: String,
    pub description: String,
    /// Object-store download URL of the letter file
    pub image_url: String,
    /// MIME type, e.g. `application/pdf`
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl Letter {
    /// Whether `account_ids` names the sender or the recipient.
    pub fn is_visible_to(&self, account_ids: &[&str]) -> bool {
        account_ids
            .iter()
            .any(|id| *id == self.sender_id || *id == self.recipient_id)
    }
}
