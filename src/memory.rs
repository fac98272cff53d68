//! In-memory namespace implementation.
//!
//! Runs the same validation as the remote namespace and stores what the
//! wire would carry: the string form of the value, its resolved absolute
//! expiration, and metadata. Expired entries are invisible. They are
//! dropped when read and purged by every `list`.
//!
//! This implementation is NOT durable - data is lost on process exit.
//! Use for testing and development only.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::decode::decode_stored;
use crate::error::Result;
use crate::list::{ListKey, ListOptions, ListPage, ListQuery};
use crate::store::KvStore;
use crate::validate::{now_unix, validate_get_options, validate_key, validate_put};
use crate::value::{GetOptions, PutOptions, PutValue, Value, ValueWithMetadata};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expiration: Option<i64>,
    metadata: Option<Json>,
}

impl StoredEntry {
    fn is_live(&self, now: i64) -> bool {
        self.expiration.map_or(true, |expiration| expiration > now)
    }
}

/// In-memory implementation of KvStore.
///
/// Uses a BTreeMap for ordered key iteration and RwLock for concurrency.
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryNamespace {
    data: Arc<RwLock<BTreeMap<String, StoredEntry>>>,
}

impl MemoryNamespace {
    /// Create a new empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = now_unix();
        self.data.read().values().filter(|e| e.is_live(now)).count()
    }

    /// Check if the namespace holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    fn live_entry(&self, key: &str) -> Option<StoredEntry> {
        let now = now_unix();
        {
            let data = self.data.read();
            let entry = data.get(key)?;
            if entry.is_live(now) {
                return Some(entry.clone());
            }
        }

        // A put may have replaced the expired entry since the read lock dropped.
        let mut data = self.data.write();
        match data.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.clone()),
            Some(_) => {
                data.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl KvStore for MemoryNamespace {
    async fn get(&self, key: &str, options: GetOptions) -> Result<Option<Value>> {
        validate_key(key)?;
        validate_get_options(&options)?;

        match self.live_entry(key) {
            Some(entry) => decode_stored(&entry.value, options.value_type).map(Some),
            None => Ok(None),
        }
    }

    async fn get_with_metadata(&self, key: &str, options: GetOptions) -> Result<ValueWithMetadata> {
        validate_key(key)?;
        validate_get_options(&options)?;

        let Some(entry) = self.live_entry(key) else {
            return Ok(ValueWithMetadata::default());
        };
        Ok(ValueWithMetadata {
            value: Some(decode_stored(&entry.value, options.value_type)?),
            metadata: entry.metadata,
        })
    }

    async fn put(&self, key: &str, value: PutValue, options: PutOptions) -> Result<()> {
        validate_key(key)?;
        let write = validate_put(&value, &options, now_unix())?;

        self.data.write().insert(
            key.to_string(),
            StoredEntry {
                value: write.value,
                expiration: write.expiration,
                metadata: write.metadata,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.data.write().remove(key);
        Ok(())
    }

    async fn list(&self, options: ListOptions) -> Result<ListPage> {
        let query = ListQuery::from_options(&options)?;
        let prefix = query.prefix.as_deref().unwrap_or("");
        let now = now_unix();

        let lower = match &query.cursor {
            Some(cursor) => Bound::Excluded(cursor.clone()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut data = self.data.write();
        data.retain(|_, entry| entry.is_live(now));
        let keys: Vec<ListKey> = data
            .range((lower, Bound::Unbounded))
            .skip_while(|(name, _)| name.as_str() < prefix)
            .take_while(|(name, _)| name.starts_with(prefix))
            .take(query.limit as usize)
            .map(|(name, entry)| ListKey {
                name: name.clone(),
                expiration: entry.expiration,
                metadata: entry.metadata.clone(),
            })
            .collect();

        let cursor = if keys.len() == query.limit as usize {
            keys.last().map(|k| k.name.clone())
        } else {
            None
        };
        Ok(ListPage::new(keys, cursor, query.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use crate::value::ValueType;
    use bytes::Bytes;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get() {
        let kv = MemoryNamespace::new();

        kv.put("/test/key", "value".into(), PutOptions::new()).await.unwrap();

        let text = kv.get_text("/test/key").await.unwrap();
        assert_eq!(text.as_deref(), Some("value"));
        assert_eq!(kv.len(), 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let kv = MemoryNamespace::new();

        kv.put("key", "v1".into(), PutOptions::new()).await.unwrap();
        kv.put("key", "v2".into(), PutOptions::new()).await.unwrap();

        assert_eq!(kv.get_text("key").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(kv.len(), 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let kv = MemoryNamespace::new();
        let result = kv.get("nonexistent", GetOptions::default()).await.unwrap();
        assert!(result.is_none());

        let result = kv
            .get_with_metadata("nonexistent", GetOptions::default())
            .await
            .unwrap();
        assert!(result.value.is_none());
        assert!(result.metadata.is_none());
    }

    #[tokio::test]
    async fn test_representations() {
        let kv = MemoryNamespace::new();
        kv.put("user:42", json!({"name": "a"}).into(), PutOptions::new())
            .await
            .unwrap();

        let value = kv
            .get("user:42", GetOptions::parse("json").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value.as_json(), Some(&json!({"name": "a"})));

        let value = kv
            .get("user:42", ValueType::Bytes.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value.as_bytes(), Some(&Bytes::from(r#"{"name":"a"}"#)));

        let stream = kv
            .get("user:42", ValueType::Stream.into())
            .await
            .unwrap()
            .and_then(Value::into_stream)
            .unwrap();
        assert_eq!(
            stream.read_to_end().await.unwrap(),
            Bytes::from(r#"{"name":"a"}"#)
        );
    }

    #[tokio::test]
    async fn test_metadata() {
        let kv = MemoryNamespace::new();
        kv.put(
            "doc",
            "body".into(),
            PutOptions::new().metadata(json!({"owner": "a"})),
        )
        .await
        .unwrap();

        let result = kv.get_with_metadata("doc", GetOptions::default()).await.unwrap();
        assert_eq!(result.value.and_then(Value::into_text).as_deref(), Some("body"));
        assert_eq!(result.metadata, Some(json!({"owner": "a"})));
    }

    #[tokio::test]
    async fn test_delete() {
        let kv = MemoryNamespace::new();

        kv.put("key", "value".into(), PutOptions::new()).await.unwrap();
        kv.delete("key").await.unwrap();
        assert!(kv.get_text("key").await.unwrap().is_none());
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_delete_nonexistent() {
        let kv = MemoryNamespace::new();
        // Should not error
        kv.delete("nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let kv = MemoryNamespace::new();
        kv.put("live", "v".into(), PutOptions::new().expiration_ttl(60))
            .await
            .unwrap();

        // Backdate an entry past its expiration.
        kv.data.write().insert(
            "stale".to_string(),
            StoredEntry {
                value: "old".to_string(),
                expiration: Some(now_unix() - 1),
                metadata: None,
            },
        );

        assert!(kv.get_text("stale").await.unwrap().is_none());
        assert!(kv.get_text("live").await.unwrap().is_some());
        let page = kv.list(ListOptions::new()).await.unwrap();
        assert_eq!(page.keys.len(), 1);
        assert_eq!(page.keys[0].name, "live");
        assert!(!kv.data.read().contains_key("stale"));
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let kv = MemoryNamespace::new();

        kv.put("workloads/a", "1".into(), PutOptions::new()).await.unwrap();
        kv.put("workloads/b", "2".into(), PutOptions::new()).await.unwrap();
        kv.put("nodes/n1", "3".into(), PutOptions::new()).await.unwrap();
        kv.put("zones/z1", "4".into(), PutOptions::new()).await.unwrap();

        let page = kv.list(ListOptions::new().prefix("workloads/")).await.unwrap();
        let names: Vec<&str> = page.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["workloads/a", "workloads/b"]);
        assert!(page.list_complete);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let kv = MemoryNamespace::new();
        for i in 0..5 {
            kv.put(&format!("user:{}", i), "v".into(), PutOptions::new())
                .await
                .unwrap();
        }
        kv.put("other", "v".into(), PutOptions::new()).await.unwrap();

        let first = kv
            .list(ListOptions::new().prefix("user:").limit(2))
            .await
            .unwrap();
        assert_eq!(first.keys.len(), 2);
        assert!(!first.list_complete);

        let second = kv
            .list(
                ListOptions::new()
                    .prefix("user:")
                    .limit(2)
                    .cursor(first.cursor.unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(second.keys[0].name, "user:2");
        assert!(!second.list_complete);

        let third = kv
            .list(
                ListOptions::new()
                    .prefix("user:")
                    .limit(2)
                    .cursor(second.cursor.unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(third.keys.len(), 1);
        assert!(third.list_complete);
    }

    #[tokio::test]
    async fn test_list_all_follows_cursors() {
        let kv = MemoryNamespace::new();
        for i in 0..1005 {
            kv.put(&format!("k{:05}", i), "v".into(), PutOptions::new())
                .await
                .unwrap();
        }

        let page = kv.list(ListOptions::new()).await.unwrap();
        assert_eq!(page.keys.len(), 1000);
        assert!(!page.list_complete);

        let all = kv.list_all("k").await.unwrap();
        assert_eq!(all.len(), 1005);
        assert_eq!(all[1004].name, "k01004");
    }

    #[tokio::test]
    async fn test_json_operations() {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct TestData {
            name: String,
            value: i32,
        }

        let kv = MemoryNamespace::new();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        kv.put_json("data", &data, PutOptions::new()).await.unwrap();
        let loaded: TestData = kv.get_json("data").await.unwrap().unwrap();
        assert_eq!(data, loaded);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let kv = MemoryNamespace::new();

        let result = kv.put("..", "v".into(), PutOptions::new()).await;
        assert!(matches!(result, Err(KvError::InvalidArgument(_))));

        let result = kv
            .put("k", PutValue::from(Bytes::from_static(b"raw")), PutOptions::new())
            .await;
        assert!(matches!(result, Err(KvError::InvalidArgument(_))));

        let result = kv.list(ListOptions::new().limit(5000)).await;
        assert!(matches!(result, Err(KvError::InvalidArgument(_))));
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let kv = MemoryNamespace::new();
        let other = kv.clone();

        kv.put("shared", "v".into(), PutOptions::new()).await.unwrap();
        assert_eq!(other.get_text("shared").await.unwrap().as_deref(), Some("v"));

        other.clear();
        assert!(kv.is_empty());
    }

    fn insert_stale(kv: &MemoryNamespace, key: &str) {
        kv.data.write().insert(
            key.to_string(),
            StoredEntry {
                value: "stale".to_string(),
                expiration: Some(now_unix() - 10),
                metadata: None,
            },
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_put_survives_concurrent_expiry() {
        for _ in 0..2000 {
            let kv = MemoryNamespace::new();
            insert_stale(&kv, "k");
            let barrier = Arc::new(tokio::sync::Barrier::new(2));

            let reader = {
                let kv = kv.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    kv.get_text("k").await.unwrap()
                })
            };
            let writer = {
                let kv = kv.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    kv.put("k", "fresh".into(), PutOptions::new()).await.unwrap();
                })
            };

            let read = reader.await.unwrap();
            writer.await.unwrap();
            assert!(matches!(read.as_deref(), None | Some("fresh")));
            assert_eq!(kv.get_text("k").await.unwrap().as_deref(), Some("fresh"));
        }
    }

    #[tokio::test]
    async fn test_list_purges_expired_entries() {
        let kv = MemoryNamespace::new();
        kv.put("user:1", "v".into(), PutOptions::new()).await.unwrap();
        insert_stale(&kv, "user:2");
        insert_stale(&kv, "other");

        let page = kv.list(ListOptions::new().prefix("user:")).await.unwrap();
        assert_eq!(page.keys.len(), 1);
        assert_eq!(page.keys[0].name, "user:1");

        // Purging is not limited to the listed prefix.
        assert_eq!(kv.data.read().len(), 1);
    }
}
