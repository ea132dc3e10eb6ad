// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote account link state, derived from the persisted account fields.

use crate::models::UserAccount;
use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where an account stands in the remote linking handshake.
///
/// `Expired` is never stored; it is an `Active` token whose expiry has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LinkState {
    /// No login-request token on file.
    Unlinked,
    /// Login-request token on file, no bearer token yet.
    LinkRequested,
    /// Bearer token obtained but the remote still wants verification.
    Pending,
    /// Usable bearer token.
    Active,
    /// Bearer token past its expiry; must be exchanged again.
    Expired,
}

impl LinkState {
    pub fn of(account: &UserAccount, now: DateTime<Utc>) -> Self {
        if account.login_request_token.is_none() {
            return LinkState::Unlinked;
        }

        if account.bearer_token.is_none() {
            return LinkState::LinkRequested;
        }

        if account.bearer_token_pending {
            return LinkState::Pending;
        }

        // Legacy records without an expiry stay active until the remote says 401.
        match account.bearer_token_expires_at {
            Some(expires_at) if now >= expires_at => LinkState::Expired,
            _ => LinkState::Active,
        }
    }
}
