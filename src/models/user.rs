//! User account model for storage and API.

use crate::models::LinkState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account stored in Firestore, keyed by the identity-provider subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Identity-provider subject (also used as document ID)
    pub id: String,
    /// Email address; required before the remote account can be linked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Handshake token obtained from the remote service for `email`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_request_token: Option<String>,
    /// Short-lived credential for remote API calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token_expires_at: Option<DateTime<Utc>>,
    /// Set while the remote still waits for out-of-band verification
    #[serde(default)]
    pub bearer_token_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// When the account was first seen
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// A freshly signed-in account with nothing linked yet.
    pub fn new(id: impl Into<String>, email: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            email: email.filter(|e| !e.trim().is_empty()),
            login_request_token: None,
            bearer_token: None,
            bearer_token_expires_at: None,
            bearer_token_pending: false,
            remote_user_id: None,
            display_name: None,
            photo_url: None,
            created_at: now,
        }
    }

    pub fn link_state(&self, now: DateTime<Utc>) -> LinkState {
        LinkState::of(self, now)
    }
}

/// Partial update of a [`UserAccount`] with merge semantics.
///
/// Only `Some` fields are written. Fields named in `cleared` are removed from
/// the stored document. Nothing else is touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_request_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token_pending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip)]
    pub cleared: Vec<&'static str>,
}

impl UserAccountPatch {
    pub const BEARER_TOKEN: &'static str = "bearer_token";
    pub const BEARER_TOKEN_EXPIRES_AT: &'static str = "bearer_token_expires_at";
    pub const BEARER_TOKEN_PENDING: &'static str = "bearer_token_pending";

    /// Patch that drops any bearer token state.
    pub fn clear_bearer_token(mut self) -> Self {
        self.bearer_token = None;
        self.bearer_token_expires_at = None;
        self.bearer_token_pending = None;
        self.cleared.extend([
            Self::BEARER_TOKEN,
            Self::BEARER_TOKEN_EXPIRES_AT,
            Self::BEARER_TOKEN_PENDING,
        ]);
        self
    }

    /// Document field paths written by this patch (the update mask).
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.email.is_some() {
            paths.push("email");
        }
        if self.login_request_token.is_some() {
            paths.push("login_request_token");
        }
        if self.bearer_token.is_some() {
            paths.push(Self::BEARER_TOKEN);
        }
        if self.bearer_token_expires_at.is_some() {
            paths.push(Self::BEARER_TOKEN_EXPIRES_AT);
        }
        if self.bearer_token_pending.is_some() {
            paths.push(Self::BEARER_TOKEN_PENDING);
        }
        if self.remote_user_id.is_some() {
            paths.push("remote_user_id");
        }
        if self.display_name.is_some() {
            paths.push("display_name");
        }
        if self.photo_url.is_some() {
            paths.push("photo_url");
        }
        for field in &self.cleared {
            if !paths.contains(field) {
                paths.push(field);
            }
        }
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Apply the patch to an in-memory account, mirroring what the store does.
    pub fn apply_to(&self, account: &mut UserAccount) {
        for field in &self.cleared {
            match *field {
                Self::BEARER_TOKEN => account.bearer_token = None,
                Self::BEARER_TOKEN_EXPIRES_AT => account.bearer_token_expires_at = None,
                Self::BEARER_TOKEN_PENDING => account.bearer_token_pending = false,
                _ => {}
            }
        }
        if let Some(v) = &self.email {
            account.email = Some(v.clone());
        }
        if let Some(v) = &self.login_request_token {
            account.login_request_token = Some(v.clone());
        }
        if let Some(v) = &self.bearer_token {
            account.bearer_token = Some(v.clone());
        }
        if let Some(v) = self.bearer_token_expires_at {
            account.bearer_token_expires_at = Some(v);
        }
        if let Some(v) = self.bearer_token_pending {
            account.bearer_token_pending = v;
        }
        if let Some(v) = &self.remote_user_id {
            account.remote_user_id = Some(v.clone());
        }
        if let Some(v) = &self.display_name {
            account.display_name = Some(v.clone());
        }
        if let Some(v) = &self.photo_url {
            account.photo_url = Some(v.clone());
        }
    }
}
