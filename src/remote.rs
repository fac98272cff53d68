//! Namespace backed by the remote bulk-storage HTTP API.
//!
//! Each operation validates its inputs, makes exactly one HTTP round trip
//! (two for `get_with_metadata` on a present key), and decodes the result.
//! There are no retries and no timeouts beyond what the `reqwest::Client`
//! was built with.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::decode::{check_status, decode_metadata, decode_value};
use crate::error::Result;
use crate::list::{ListEnvelope, ListOptions, ListPage, ListQuery};
use crate::request::{Endpoint, NamespaceApi};
use crate::store::KvStore;
use crate::validate::{now_unix, validate_get_options, validate_key, validate_put};
use crate::value::{GetOptions, PutOptions, PutValue, Value, ValueType, ValueWithMetadata};

/// One item of a `/bulk` write.
#[derive(Debug, Serialize)]
struct BulkWrite<'a> {
    key: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_ttl: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Json>,
}

/// HTTP implementation of KvStore.
///
/// Cheap to share behind an `Arc`; the URL root and headers are fixed at
/// construction and only read afterwards.
pub struct RemoteNamespace {
    http: Client,
    api: NamespaceApi,
}

impl RemoteNamespace {
    /// Create a client with a default `reqwest::Client`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Self::with_client(config, http)
    }

    /// Create a client from `ClientConfig::from_env`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client that sends requests through `http`.
    pub fn with_client(config: ClientConfig, http: Client) -> Result<Self> {
        config.validate()?;
        let api = NamespaceApi::new(&config)?;
        info!(
            account = %config.account_id,
            namespace = %config.namespace_id,
            "Remote namespace client targeting {}",
            api.base()
        );
        Ok(Self { http, api })
    }

    /// Get the namespace root URL and header set.
    pub fn api(&self) -> &NamespaceApi {
        &self.api
    }

    fn request(&self, method: Method, endpoint: Endpoint<'_>) -> RequestBuilder {
        debug!(
            method = %method,
            endpoint = endpoint.kind(),
            key = endpoint.key(),
            "namespace request"
        );
        self.http
            .request(method, self.api.url(endpoint))
            .headers(self.api.headers().clone())
    }

    async fn fetch_value(&self, key: &str, value_type: ValueType) -> Result<Option<Value>> {
        let response = self.request(Method::GET, Endpoint::Value(key)).send().await?;
        decode_value(response, value_type).await
    }
}

#[async_trait]
impl KvStore for RemoteNamespace {
    async fn get(&self, key: &str, options: GetOptions) -> Result<Option<Value>> {
        validate_key(key)?;
        validate_get_options(&options)?;
        self.fetch_value(key, options.value_type).await
    }

    async fn get_with_metadata(&self, key: &str, options: GetOptions) -> Result<ValueWithMetadata> {
        validate_key(key)?;
        validate_get_options(&options)?;

        let Some(value) = self.fetch_value(key, options.value_type).await? else {
            return Ok(ValueWithMetadata::default());
        };

        let response = self.request(Method::GET, Endpoint::Metadata(key)).send().await?;
        let metadata = decode_metadata(response).await?;
        Ok(ValueWithMetadata {
            value: Some(value),
            metadata,
        })
    }

    async fn put(&self, key: &str, value: PutValue, options: PutOptions) -> Result<()> {
        validate_key(key)?;
        let write = validate_put(&value, &options, now_unix())?;

        let body = [BulkWrite {
            key,
            value: &write.value,
            expiration: write.expiration,
            expiration_ttl: write.expiration_ttl,
            metadata: write.metadata.as_ref(),
        }];
        let response = self.request(Method::PUT, Endpoint::Bulk).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let response = self.request(Method::DELETE, Endpoint::Value(key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage> {
        let query = ListQuery::from_options(&options)?;

        let response = self
            .request(Method::GET, Endpoint::Keys)
            .query(&query.pairs())
            .send()
            .await?;
        let envelope: ListEnvelope = check_status(response).await?.json().await?;
        Ok(envelope.into_page(query.limit))
    }
}
