//! URL and header construction for namespace requests.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;

use crate::config::{ClientConfig, Credentials};
use crate::error::{KvError, Result};

/// Account email header for email/key authentication.
pub const API_EMAIL_HEADER: &str = "x-api-email";
/// Global API key header for email/key authentication.
pub const AUTH_KEY_HEADER: &str = "x-auth-key";

/// Route under the namespace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `/values/{key}`: get, delete.
    Value(&'a str),
    /// `/metadata/{key}`.
    Metadata(&'a str),
    /// `/bulk`: put.
    Bulk,
    /// `/keys`: list.
    Keys,
}

impl Endpoint<'_> {
    /// Route name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Endpoint::Value(_) => "values",
            Endpoint::Metadata(_) => "metadata",
            Endpoint::Bulk => "bulk",
            Endpoint::Keys => "keys",
        }
    }

    /// The key this route addresses, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Endpoint::Value(key) | Endpoint::Metadata(key) => Some(*key),
            Endpoint::Bulk | Endpoint::Keys => None,
        }
    }
}

/// Namespace root URL and the header set, fixed at construction.
#[derive(Debug, Clone)]
pub struct NamespaceApi {
    base: Url,
    headers: HeaderMap,
}

impl NamespaceApi {
    /// Build the namespace root and headers from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut base = Url::parse(config.api_base())
            .map_err(|e| KvError::Config(format!("invalid api base {:?}: {}", config.api_base(), e)))?;
        base.path_segments_mut()
            .map_err(|_| KvError::Config(format!("api base {:?} cannot be a base URL", config.api_base())))?
            .pop_if_empty()
            .extend([
                "accounts",
                config.account_id.as_str(),
                "storage",
                "kv",
                "namespaces",
                config.namespace_id.as_str(),
            ]);

        Ok(Self {
            base,
            headers: build_headers(&config.credentials()?)?,
        })
    }

    /// Namespace root, e.g. `.../accounts/{account}/storage/kv/namespaces/{namespace}`.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Absolute URL for an endpoint. Keys are encoded as one path segment.
    pub fn url(&self, endpoint: Endpoint<'_>) -> Url {
        let mut url = self.base.clone();
        // The base was checked to be hierarchical in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            match endpoint {
                Endpoint::Value(key) => {
                    segments.extend(["values", key]);
                }
                Endpoint::Metadata(key) => {
                    segments.extend(["metadata", key]);
                }
                Endpoint::Bulk => {
                    segments.push("bulk");
                }
                Endpoint::Keys => {
                    segments.push("keys");
                }
            }
        }
        url
    }
}

fn build_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    match credentials {
        Credentials::Token(token) => {
            let mut value = header_value("api_token", &format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Credentials::EmailKey { email, key } => {
            headers.insert(API_EMAIL_HEADER, header_value("api_email", email)?);
            let mut value = header_value("api_key", key)?;
            value.set_sensitive(true);
            headers.insert(AUTH_KEY_HEADER, value);
        }
    }

    Ok(headers)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| KvError::Config(format!("{} contains characters not allowed in a header", field)))
}
