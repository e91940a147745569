//! Server configuration, loaded from environment variables at startup.
//!
//! The portal talks to three hosted collaborators: the relational store
//! (PostgREST + Storage), and the identity provider. All three are
//! configured here; nothing is read from ambient state after startup.

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind host for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
    /// Dev mode: a synthetic identity is attached to every request and
    /// token verification is skipped.
    pub dev_mode: bool,

    /// Base URL of the hosted datastore (PostgREST + Storage under one host).
    pub store_url: String,
    /// Service-role key for the datastore.
    pub store_service_key: String,
    /// Storage bucket for deliverable assets.
    pub storage_bucket: String,

    /// Secret used to verify identity-provider session tokens.
    pub jwt_secret: Option<String>,
    /// Base URL of the identity provider's management API (member metadata).
    pub identity_api_url: Option<String>,
    /// API key for the identity provider's management API.
    pub identity_api_key: Option<String>,

    /// Where page-level callers are redirected on an access failure.
    pub redirect_fallback: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required: `STORE_URL`, `STORE_SERVICE_KEY`. Everything else has a
    /// default or is optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let store_url = std::env::var("STORE_URL")
            .map_err(|_| anyhow::anyhow!("STORE_URL is required"))?;
        let store_service_key = std::env::var("STORE_SERVICE_KEY")
            .map_err(|_| anyhow::anyhow!("STORE_SERVICE_KEY is required"))?;

        let dev_mode = std::env::var("DEV_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let config = Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            dev_mode,
            store_url,
            store_service_key,
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "deliverables".to_string()),
            jwt_secret: std::env::var("JWT_SECRET").ok(),
            identity_api_url: std::env::var("IDENTITY_API_URL").ok(),
            identity_api_key: std::env::var("IDENTITY_API_KEY").ok(),
            redirect_fallback: std::env::var("REDIRECT_FALLBACK")
                .unwrap_or_else(|_| "/sign-in".to_string()),
        };

        if !config.dev_mode && config.jwt_secret.is_none() {
            anyhow::bail!("JWT_SECRET is required when DEV_MODE is off");
        }

        Ok(config)
    }
}
