//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Use the in-memory store instead of Firestore (`STORE=memory`)
    pub in_memory_store: bool,
    /// Key used to verify identity-provider session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Remote account service settings
    pub remote: RemoteConfig,
}

/// Credentials and host for the remote account service.
///
/// Each value is optional at load time so the API can still serve plain
/// letter and contact reads; the remote client refuses to run unless all
/// three are present.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub host: Option<String>,
}

/// A complete set of remote credentials.
#[derive(Debug, Clone)]
pub struct RemoteCredentials {
    pub app_id: String,
    pub api_key: String,
    pub host: String,
}

impl RemoteConfig {
    /// Returns the credentials only when every field is set and non-blank.
    pub fn credentials(&self) -> Option<RemoteCredentials> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }

        Some(RemoteCredentials {
            app_id: present(&self.app_id)?.trim().to_string(),
            api_key: present(&self.api_key)?.trim().to_string(),
            host: present(&self.host)?.trim().trim_end_matches('/').to_string(),
        })
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            in_memory_store: true,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            remote: RemoteConfig {
                app_id: Some("test_app_id".to_string()),
                api_key: Some("test_api_key".to_string()),
                host: Some("http://127.0.0.1:9".to_string()),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            in_memory_store: env::var("STORE")
                .map(|v| v.eq_ignore_ascii_case("memory"))
                .unwrap_or(false),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            remote: RemoteConfig {
                app_id: env::var("REMOTE_APP_ID").ok(),
                api_key: env::var("REMOTE_API_KEY").ok(),
                host: env::var("REMOTE_HOST").ok(),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
