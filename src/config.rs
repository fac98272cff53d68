//! Client configuration: account, namespace, and credentials.

use serde::Deserialize;
use std::fmt;

use crate::error::{KvError, Result};

/// Base URL of the public API.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

// Environment variables read by `ClientConfig::from_env`.

/// Account id.
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
/// Namespace id.
pub const ENV_NAMESPACE_ID: &str = "KV_NAMESPACE_ID";
/// API token; takes precedence over email/key.
pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
/// Account email for email/key authentication.
pub const ENV_API_EMAIL: &str = "CLOUDFLARE_EMAIL";
/// Global API key for email/key authentication.
pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
/// Override for [`DEFAULT_API_BASE`].
pub const ENV_API_BASE: &str = "CLOUDFLARE_API_BASE";

/// Authentication scheme sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `authorization: Bearer <token>`.
    Token(String),
    /// `x-api-email` / `x-auth-key` header pair.
    EmailKey { email: String, key: String },
}

impl Credentials {
    /// Authenticate with an API token.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Authenticate with an account email and global API key.
    pub fn email_key(email: impl Into<String>, key: impl Into<String>) -> Self {
        Self::EmailKey {
            email: email.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Credentials::EmailKey { email, .. } => f
                .debug_struct("EmailKey")
                .field("email", email)
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration for a [`RemoteNamespace`](crate::RemoteNamespace).
///
/// Deserializable so it can be embedded in an application's own config
/// file. Validated once, when the client is constructed.
#[derive(Clone, Default, Deserialize)]
pub struct ClientConfig {
    pub account_id: String,
    pub namespace_id: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub api_email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for [`DEFAULT_API_BASE`].
    #[serde(default)]
    pub api_base: Option<String>,
}

impl ClientConfig {
    /// Create a config from identifiers and a credential scheme.
    pub fn new(
        account_id: impl Into<String>,
        namespace_id: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let mut config = Self {
            account_id: account_id.into(),
            namespace_id: namespace_id.into(),
            ..Default::default()
        };
        match credentials {
            Credentials::Token(token) => config.api_token = Some(token),
            Credentials::EmailKey { email, key } => {
                config.api_email = Some(email);
                config.api_key = Some(key);
            }
        }
        config
    }

    /// Point the client at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            account_id: lookup(ENV_ACCOUNT_ID).unwrap_or_default(),
            namespace_id: lookup(ENV_NAMESPACE_ID).unwrap_or_default(),
            api_token: lookup(ENV_API_TOKEN),
            api_email: lookup(ENV_API_EMAIL),
            api_key: lookup(ENV_API_KEY),
            api_base: lookup(ENV_API_BASE),
        };
        config.validate()?;
        Ok(config)
    }

    /// The API root to build request URLs from.
    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .filter(|base| !base.is_empty())
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Resolve the credential scheme. A token wins over an email/key pair.
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = non_empty(&self.api_token) {
            return Ok(Credentials::Token(token.to_string()));
        }
        match (non_empty(&self.api_email), non_empty(&self.api_key)) {
            (Some(email), Some(key)) => Ok(Credentials::EmailKey {
                email: email.to_string(),
                key: key.to_string(),
            }),
            _ => Err(KvError::Config(
                "either api_token or both api_email and api_key must be provided".to_string(),
            )),
        }
    }

    /// Check identifiers and credentials.
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(KvError::Config("account_id is required".to_string()));
        }
        if self.namespace_id.trim().is_empty() {
            return Err(KvError::Config("namespace_id is required".to_string()));
        }
        self.credentials().map(|_| ())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("account_id", &self.account_id)
            .field("namespace_id", &self.namespace_id)
            .field("api_token", &redacted(&self.api_token))
            .field("api_email", &self.api_email)
            .field("api_key", &redacted(&self.api_key))
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
