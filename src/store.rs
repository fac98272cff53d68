//! KvStore trait - the operation surface shared by every namespace backend.
//!
//! Every operation validates its inputs first and fails without side
//! effects if they are invalid. Absent keys are `None`, never an error.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::list::{ListKey, ListOptions, ListPage};
use crate::value::{GetOptions, PutOptions, PutValue, Value, ValueType, ValueWithMetadata};

/// A key-value namespace.
///
/// Implementations hold only immutable configuration, so a single instance
/// can serve concurrent calls without locking.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value in the requested representation.
    ///
    /// Returns `None` if the key does not exist.
    async fn get(&self, key: &str, options: GetOptions) -> Result<Option<Value>>;

    /// Read a value as a string.
    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key, ValueType::Text.into())
            .await?
            .and_then(Value::into_text))
    }

    /// Read a value and deserialize it from JSON.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key, ValueType::Json.into()).await? {
            Some(Value::Json(json)) => Ok(Some(serde_json::from_value(json)?)),
            _ => Ok(None),
        }
    }

    /// Read a value together with its metadata.
    ///
    /// If the key does not exist, both parts are `None` and metadata is
    /// never fetched.
    async fn get_with_metadata(&self, key: &str, options: GetOptions) -> Result<ValueWithMetadata>;

    /// Write a value, replacing any existing one.
    async fn put(&self, key: &str, value: PutValue, options: PutOptions) -> Result<()>;

    /// Serialize a value to JSON and write it.
    async fn put_json<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        options: PutOptions,
    ) -> Result<()> {
        self.put(key, PutValue::json(value)?, options).await
    }

    /// Delete a key.
    ///
    /// Returns `Ok(())` if the key was deleted or didn't exist.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Fetch one page of keys.
    async fn list(&self, options: ListOptions) -> Result<ListPage>;

    /// Fetch every key under a prefix, following cursors.
    async fn list_all(&self, prefix: &str) -> Result<Vec<ListKey>> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut options = ListOptions::new().prefix(prefix);
            options.cursor = cursor.take();
            let page = self.list(options).await?;
            keys.extend(page.keys);

            match page.cursor {
                Some(next) if !page.list_complete && !next.is_empty() => cursor = Some(next),
                _ => return Ok(keys),
            }
        }
    }
}
