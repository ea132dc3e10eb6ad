// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote account service client.
//!
//! Handles:
//! - Login requests (email → login-request token)
//! - Token exchange (login-request token → bearer token, possibly pending)
//! - Profile and followed-contacts lookups with a bearer token
//!
//! Every call needs the app id, API key and host from configuration; without
//! them the client fails before touching the network.

use crate::config::{RemoteConfig, RemoteCredentials};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path prefix of the developer API on the remote host.
const API_PREFIX: &str = "/api/dev";

/// Permission scope header required by the social-graph endpoint.
const SOCIAL_GRAPH_PERMISSION: &str = "user_social_graph";

/// Remote account service client.
#[derive(Clone)]
pub struct RemoteAccountClient {
    http: reqwest::Client,
    credentials: Option<RemoteCredentials>,
}

impl RemoteAccountClient {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials: config.credentials(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&RemoteCredentials, AppError> {
        self.credentials
            .as_ref()
            .ok_or(AppError::RemoteServiceUnconfigured)
    }

    fn url(creds: &RemoteCredentials, path: &str) -> String {
        format!("{}{}{}", creds.host, API_PREFIX, path)
    }

    /// Ask the remote to start a login for `email`.
    ///
    /// POST {host}/api/dev/signin {"username": email}
    pub async fn request_login(&self, email: &str) -> Result<String, AppError> {
        let creds = self.credentials()?;

        let response = self
            .http
            .post(Self::url(creds, "/signin"))
            .header("X-App-Id", &creds.app_id)
            .header("X-Api-Key", &creds.api_key)
            .json(&SignInRequest { username: email })
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("Sign-in request failed: {}", e)))?;

        let body: LoginResponse = check_response_json(response).await?;
        Ok(body.login_request_token)
    }

    /// Exchange a login-request token for a bearer token.
    ///
    /// GET {host}/api/dev/token?otp={login_request_token}
    pub async fn exchange_token(&self, login_request_token: &str) -> Result<TokenGrant, AppError> {
        let creds = self.credentials()?;

        let response = self
            .http
            .get(Self::url(creds, "/token"))
            .header("X-App-Id", &creds.app_id)
            .query(&[("otp", login_request_token)])
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("Token request failed: {}", e)))?;

        check_response_json(response).await
    }

    /// Fetch the profile of the bearer token's owner.
    ///
    /// GET {host}/api/dev/me
    pub async fn fetch_profile(&self, bearer_token: &str) -> Result<RemoteProfile, AppError> {
        let creds = self.credentials()?;

        let response = self
            .http
            .get(Self::url(creds, "/me"))
            .header("X-App-Id", &creds.app_id)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("Profile request failed: {}", e)))?;

        let profile: RemoteUser = check_response_json(response).await?;
        Ok(profile.into())
    }

    /// Fetch one page of the people the bearer token's owner follows.
    ///
    /// GET {host}/api/dev/socialgraph/followed
    pub async fn fetch_contacts(
        &self,
        bearer_token: &str,
        query: &ContactQuery,
    ) -> Result<ContactPage, AppError> {
        let creds = self.credentials()?;

        let response = self
            .http
            .get(Self::url(creds, "/socialgraph/followed"))
            .header("X-App-Id", &creds.app_id)
            .header("requiredPermissions", SOCIAL_GRAPH_PERMISSION)
            .header(reqwest::header::ACCEPT, "*/*")
            .bearer_auth(bearer_token)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("Contacts request failed: {}", e)))?;

        let body: FollowedResponse = check_response_json(response).await?;
        Ok(ContactPage {
            contacts: body.list.into_iter().map(|f| f.user.into()).collect(),
            next_cursor: body.next_page,
        })
    }
}

/// Check response status and parse JSON body.
///
/// Non-2xx answers are returned to the caller with status and body intact.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Remote account service rate limit hit (429)");
        }

        return Err(AppError::RemoteRequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| AppError::RemoteUnavailable(format!("JSON parse error: {}", e)))
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    username: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    login_request_token: String,
}

/// Result of a token exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// True while the user still has to confirm out of band.
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Profile of a remote user.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProfile {
    pub user_id: String,
    pub name: String,
    pub handle: Option<String>,
    pub photo_url: Option<String>,
}

/// One page of followed contacts.
#[derive(Debug, Clone)]
pub struct ContactPage {
    pub contacts: Vec<RemoteProfile>,
    pub next_cursor: Option<String>,
}

/// Optional paging and search parameters for [`RemoteAccountClient::fetch_contacts`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactQuery {
    #[serde(default, rename = "search")]
    pub search_term: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default, rename = "limit")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub after_id: Option<String>,
}

impl ContactQuery {
    /// Query parameters in the remote's naming. Absent or empty values are left out.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                params.push((name, v));
            }
        };

        push("searchStr", self.search_term.clone());
        push("nextId", self.cursor.clone());
        push("limit", self.page_size.map(|n| n.to_string()));
        push("maxResults", self.max_results.map(|n| n.to_string()));
        push("afterId", self.after_id.clone());
        params
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteUser {
    user_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    profile_photo: Option<ProfilePhoto>,
}

#[derive(Deserialize)]
struct ProfilePhoto {
    #[serde(default)]
    small: Option<String>,
}

impl From<RemoteUser> for RemoteProfile {
    fn from(user: RemoteUser) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            handle: user.handle,
            photo_url: user.profile_photo.and_then(|p| p.small),
        }
    }
}

#[derive(Deserialize)]
struct FollowedUser {
    user: RemoteUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowedResponse {
    #[serde(default)]
    list: Vec<FollowedUser>,
    #[serde(default)]
    next_page: Option<String>,
}
