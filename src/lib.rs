//! # kv-bridge
//!
//! Edge key-value namespace semantics for code running outside the edge.
//!
//! This crate translates the familiar namespace operations (get,
//! get-with-metadata, put, delete, list) into calls against the remote
//! bulk-storage HTTP API, so application code written against a namespace
//! binding can run unmodified against the same data from anywhere:
//!
//! - **Validation first**: key names, sizes, TTLs and expirations are checked
//!   locally; invalid input never produces a request
//! - **Typed reads**: text, JSON, bytes, or a byte stream, chosen per call
//! - **Absent is not an error**: missing keys read as `None`
//! - **Cursor pagination**: a page is complete only when it comes back short
//!
//! ## Backends
//!
//! - [`RemoteNamespace`]: the HTTP API (production)
//! - [`MemoryNamespace`]: in-process map (testing and development)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kv_bridge::{ClientConfig, Credentials, GetOptions, KvStore, PutOptions, RemoteNamespace};
//!
//! #[tokio::main]
//! async fn main() -> kv_bridge::Result<()> {
//!     let config = ClientConfig::new("account-id", "namespace-id", Credentials::token("api-token"));
//!     let kv = RemoteNamespace::new(config)?;
//!
//!     // Write a value that expires in an hour
//!     kv.put("greeting", "hello".into(), PutOptions::new().expiration_ttl(3600)).await?;
//!
//!     // Read it back
//!     if let Some(text) = kv.get_text("greeting").await? {
//!         println!("{}", text);
//!     }
//!
//!     // Or choose the representation by token
//!     let value = kv.get("greeting", GetOptions::parse("arrayBuffer")?).await?;
//!     println!("{:?}", value);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## JSON Values
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use kv_bridge::{KvStore, MemoryNamespace, PutOptions};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> kv_bridge::Result<()> {
//!     let kv = MemoryNamespace::new();
//!
//!     kv.put_json("user:42", &User { name: "a".to_string() }, PutOptions::new()).await?;
//!
//!     let user: User = kv.get_json("user:42").await?.unwrap();
//!     println!("{:?}", user);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Listing
//!
//! ```rust,no_run
//! use kv_bridge::{KvStore, ListOptions, RemoteNamespace};
//!
//! #[tokio::main]
//! async fn main() -> kv_bridge::Result<()> {
//!     let kv = RemoteNamespace::from_env()?;
//!
//!     let mut options = ListOptions::new().prefix("user:").limit(100);
//!     loop {
//!         let page = kv.list(options.clone()).await?;
//!         for key in &page.keys {
//!             println!("{} expires {:?}", key.name, key.expiration);
//!         }
//!         match page.cursor {
//!             Some(cursor) if !page.list_complete => options = options.cursor(cursor),
//!             _ => break,
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod list;
pub mod memory;
pub mod remote;
pub mod request;
pub mod store;
pub mod validate;
pub mod value;

mod decode;

// Re-export main types
pub use config::{ClientConfig, Credentials};
pub use error::{KvError, Result};
pub use list::{ListKey, ListOptions, ListPage};
pub use memory::MemoryNamespace;
pub use remote::RemoteNamespace;
pub use store::KvStore;
pub use validate::{
    MAX_KEY_SIZE, MAX_LIST_LIMIT, MAX_METADATA_SIZE, MAX_VALUE_SIZE, MIN_CACHE_TTL,
    MIN_EXPIRATION_TTL,
};
pub use value::{
    GetOptions, Numeric, PutOptions, PutValue, Value, ValueStream, ValueType, ValueWithMetadata,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ClientConfig, Credentials};
    pub use crate::error::{KvError, Result};
    pub use crate::list::{ListKey, ListOptions, ListPage};
    pub use crate::memory::MemoryNamespace;
    pub use crate::remote::RemoteNamespace;
    pub use crate::store::KvStore;
    pub use crate::value::{GetOptions, PutOptions, PutValue, Value, ValueType, ValueWithMetadata};
}
