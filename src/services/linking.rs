// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote account linking and bearer-token lifecycle.
//!
//! Every operation takes the caller's [`UserAccount`] by value, persists the
//! fields it changes as a merge patch, and hands back the updated account.
//! Nothing here retries on its own: a pending verification or a remote
//! failure goes back to the caller, and the user repeats the action.

use crate::db::UserRecordStore;
use crate::error::AppError;
use crate::models::{LinkState, UserAccount, UserAccountPatch};
use crate::services::reconcile::{ContactReconciler, ReconcileReport};
use crate::services::remote::{ContactQuery, RemoteAccountClient, RemoteProfile};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifetime assumed for a bearer token when the remote does not say.
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Outcome of a token exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TokenStatus {
    /// The remote still waits for out-of-band verification.
    Pending,
    /// A usable bearer token is on file.
    Active,
}

/// Source of "now", so expiry logic can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Drives the linking handshake for one account at a time.
#[derive(Clone)]
pub struct LinkingService {
    client: RemoteAccountClient,
    store: Arc<dyn UserRecordStore>,
    reconciler: ContactReconciler,
    clock: Arc<dyn Clock>,
}

impl LinkingService {
    pub fn new(client: RemoteAccountClient, store: Arc<dyn UserRecordStore>) -> Self {
        Self::with_clock(client, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: RemoteAccountClient,
        store: Arc<dyn UserRecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reconciler: ContactReconciler::new(store.clone()),
            client,
            store,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Persist `patch` and return the account with it applied.
    async fn commit(
        &self,
        mut account: UserAccount,
        patch: UserAccountPatch,
    ) -> Result<UserAccount, AppError> {
        self.store.merge_user(&account.id, &patch).await?;
        patch.apply_to(&mut account);
        Ok(account)
    }

    // ─── Sign-in ─────────────────────────────────────────────────────────────

    /// Load or create the account for a signed-in user, then request a remote
    /// link if it has an email and none was requested before. An email carried
    /// by the session fills in an account that has none.
    ///
    /// The link request is awaited; its failure is returned to the caller.
    pub async fn complete_sign_in(
        &self,
        user_id: &str,
        email: Option<String>,
    ) -> Result<UserAccount, AppError> {
        let account = match self.store.get_user(user_id).await? {
            Some(account) => self.adopt_email(account, email).await?,
            None => {
                let account = UserAccount::new(user_id, email, self.now());
                self.store.create_user(&account).await?;
                tracing::info!(user_id, "Created user account on first sign-in");
                account
            }
        };

        if account.email.is_some() && account.login_request_token.is_none() {
            return self.request_link(account).await;
        }

        Ok(account)
    }

    /// Store an email from the session on an account that has none yet.
    async fn adopt_email(
        &self,
        account: UserAccount,
        email: Option<String>,
    ) -> Result<UserAccount, AppError> {
        let email = email.filter(|e| !e.trim().is_empty());
        match (&account.email, email) {
            (None, Some(email)) => {
                tracing::info!(user_id = %account.id, "Email added to existing account");
                let patch = UserAccountPatch {
                    email: Some(email),
                    ..Default::default()
                };
                self.commit(account, patch).await
            }
            _ => Ok(account),
        }
    }

    // ─── Linking ─────────────────────────────────────────────────────────────

    /// `Unlinked → LinkRequested`. Does nothing if a login-request token exists.
    pub async fn request_link(&self, account: UserAccount) -> Result<UserAccount, AppError> {
        if account.login_request_token.is_some() {
            return Ok(account);
        }
        self.link(account, UserAccountPatch::default()).await
    }

    /// Explicit re-link: replace the login-request token and drop any bearer token.
    pub async fn relink(&self, account: UserAccount) -> Result<UserAccount, AppError> {
        self.link(account, UserAccountPatch::default().clear_bearer_token())
            .await
    }

    async fn link(
        &self,
        account: UserAccount,
        mut patch: UserAccountPatch,
    ) -> Result<UserAccount, AppError> {
        let email = account.email.clone().ok_or_else(|| {
            AppError::PreconditionFailed("an email address is required to link an account".to_string())
        })?;

        let token = self.client.request_login(&email).await?;
        tracing::info!(user_id = %account.id, "Remote login requested");

        patch.login_request_token = Some(token);
        self.commit(account, patch).await
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Exchange the login-request token for a bearer token.
    ///
    /// A returned token is stored even while pending so later calls can reuse
    /// it. The login-request token is never touched.
    pub async fn exchange_token(
        &self,
        account: UserAccount,
    ) -> Result<(UserAccount, TokenStatus), AppError> {
        let login_request_token = account.login_request_token.clone().ok_or_else(|| {
            AppError::PreconditionFailed("must link account first".to_string())
        })?;

        let grant = self.client.exchange_token(&login_request_token).await?;
        let status = if grant.pending {
            TokenStatus::Pending
        } else {
            TokenStatus::Active
        };

        let Some(token) = grant.token else {
            if grant.pending {
                tracing::info!(user_id = %account.id, "Token exchange pending, no token issued yet");
                return Ok((account, TokenStatus::Pending));
            }
            return Err(AppError::RemoteUnavailable(
                "token exchange succeeded without a token".to_string(),
            ));
        };

        // Never store a token without an expiry.
        let expires_at = grant
            .expires_at
            .unwrap_or_else(|| self.now() + Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS));

        let patch = UserAccountPatch {
            bearer_token: Some(token),
            bearer_token_expires_at: Some(expires_at),
            bearer_token_pending: Some(grant.pending),
            ..Default::default()
        };
        let account = self.commit(account, patch).await?;

        tracing::info!(
            user_id = %account.id,
            status = ?status,
            expires_at = %expires_at,
            "Bearer token stored"
        );
        Ok((account, status))
    }

    /// Return a usable bearer token, exchanging again when the stored one is
    /// missing, pending or expired.
    pub async fn ensure_bearer_token(
        &self,
        account: UserAccount,
    ) -> Result<(UserAccount, String), AppError> {
        match account.link_state(self.now()) {
            LinkState::Unlinked => {
                return Err(AppError::PreconditionFailed(
                    "must link account first".to_string(),
                ))
            }
            LinkState::Active => {
                if let Some(token) = account.bearer_token.clone() {
                    return Ok((account, token));
                }
            }
            LinkState::Expired => {
                tracing::info!(user_id = %account.id, "Bearer token expired, exchanging again");
            }
            LinkState::LinkRequested | LinkState::Pending => {}
        }

        let (account, status) = self.exchange_token(account).await?;
        match (status, account.bearer_token.clone()) {
            (TokenStatus::Active, Some(token)) => Ok((account, token)),
            _ => Err(AppError::PendingVerification),
        }
    }

    /// Mark the bearer token expired when the remote rejected it, so the next
    /// call exchanges the login-request token again.
    async fn expire_if_rejected<T>(
        &self,
        account: &UserAccount,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        let err = match result {
            Err(err) if err.is_reconnect_required() => err,
            other => return other,
        };

        tracing::warn!(user_id = %account.id, "Remote rejected bearer token, marking it expired");
        let patch = UserAccountPatch {
            bearer_token_expires_at: Some(self.now()),
            ..Default::default()
        };
        if let Err(e) = self.store.merge_user(&account.id, &patch).await {
            tracing::error!(user_id = %account.id, error = %e, "Failed to expire rejected token");
        }
        Err(err)
    }

    // ─── Remote Data ─────────────────────────────────────────────────────────

    /// Fetch the remote profile and store it on the account.
    pub async fn connect(&self, account: UserAccount) -> Result<UserAccount, AppError> {
        let (account, token) = self.ensure_bearer_token(account).await?;
        let profile: RemoteProfile = self
            .expire_if_rejected(&account, self.client.fetch_profile(&token).await)
            .await?;

        let patch = UserAccountPatch {
            remote_user_id: Some(profile.user_id),
            display_name: Some(profile.name).filter(|n| !n.is_empty()),
            photo_url: profile.photo_url,
            ..Default::default()
        };
        let account = self.commit(account, patch).await?;

        tracing::info!(
            user_id = %account.id,
            remote_user_id = ?account.remote_user_id,
            "Remote account connected"
        );
        Ok(account)
    }

    /// Fetch followed contacts and replace the local contact set with them.
    pub async fn refresh_contacts(
        &self,
        account: UserAccount,
        query: &ContactQuery,
    ) -> Result<(UserAccount, ReconcileReport), AppError> {
        let (account, token) = self.ensure_bearer_token(account).await?;
        let page = self
            .expire_if_rejected(&account, self.client.fetch_contacts(&token, query).await)
            .await?;

        let mut report = self
            .reconciler
            .reconcile(&account.id, &page.contacts, self.now())
            .await?;
        report.next_cursor = page.next_cursor;

        Ok((account, report))
    }
}
