//! Value representations for reads and writes.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use tokio_stream::{Stream, StreamExt};

use crate::error::{KvError, Result};

/// Representation a read decodes the stored value into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueType {
    /// UTF-8 string.
    #[default]
    Text,
    /// Parsed JSON document.
    Json,
    /// The full body as bytes.
    Bytes,
    /// The body as a single-pass byte stream.
    Stream,
}

impl FromStr for ValueType {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ValueType::Text),
            "json" => Ok(ValueType::Json),
            "arrayBuffer" | "bytes" => Ok(ValueType::Bytes),
            "stream" => Ok(ValueType::Stream),
            other => Err(KvError::InvalidArgument(format!(
                "unknown value type {:?}, expected one of \"text\", \"json\", \"arrayBuffer\" or \"stream\"",
                other
            ))),
        }
    }
}

/// Options for `get` and `get_with_metadata`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub value_type: ValueType,
    /// Accepted for interface compatibility. Only checked against the
    /// 60-second floor; nothing is cached.
    pub cache_ttl: Option<Numeric>,
}

impl GetOptions {
    /// Read as `value_type` with no cache TTL.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            cache_ttl: None,
        }
    }

    /// Parse the bare-token form (`"text"`, `"json"`, ...).
    pub fn parse(token: &str) -> Result<Self> {
        token.parse().map(Self::new)
    }

    /// Set the cache TTL hint in seconds.
    pub fn cache_ttl(mut self, ttl: impl Into<Numeric>) -> Self {
        self.cache_ttl = Some(ttl.into());
        self
    }
}

impl From<ValueType> for GetOptions {
    fn from(value_type: ValueType) -> Self {
        Self::new(value_type)
    }
}

/// A value read from the namespace, shaped by the requested [`ValueType`].
#[derive(Debug)]
pub enum Value {
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
    Stream(ValueStream),
}

impl Value {
    /// The representation this value was read as.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Json(_) => ValueType::Json,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Stream(_) => ValueType::Stream,
        }
    }

    /// Borrow the text, if read as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the JSON, if read as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    /// Borrow the bytes, if read as bytes.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Take the text, if read as text.
    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Take the JSON, if read as JSON.
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    /// Take the stream, if read as a stream.
    pub fn into_stream(self) -> Option<ValueStream> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Single-pass stream over a value's bytes. Not restartable.
pub struct ValueStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
}

impl ValueStream {
    /// Wrap a byte-chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub(crate) fn once(bytes: Bytes) -> Self {
        Self::new(tokio_stream::once(Ok(bytes)))
    }

    /// Drain the stream into one buffer.
    pub async fn read_to_end(mut self) -> Result<Bytes> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }
}

impl Stream for ValueStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ValueStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStream").finish_non_exhaustive()
    }
}

/// Result of `get_with_metadata`. Both fields are `None` when the key is absent.
#[derive(Debug, Default)]
pub struct ValueWithMetadata {
    pub value: Option<Value>,
    pub metadata: Option<serde_json::Value>,
}

/// A value to write.
///
/// Only text and JSON can be written. `Binary` is rejected with
/// `InvalidArgument`, even though reads can return bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PutValue {
    Text(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

impl PutValue {
    /// Serialize any serde value into a JSON write.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(PutValue::Json(serde_json::to_value(value)?))
    }
}

impl From<&str> for PutValue {
    fn from(value: &str) -> Self {
        PutValue::Text(value.to_string())
    }
}

impl From<String> for PutValue {
    fn from(value: String) -> Self {
        PutValue::Text(value)
    }
}

impl From<serde_json::Value> for PutValue {
    fn from(value: serde_json::Value) -> Self {
        PutValue::Json(value)
    }
}

impl From<Bytes> for PutValue {
    fn from(value: Bytes) -> Self {
        PutValue::Binary(value)
    }
}

impl From<Vec<u8>> for PutValue {
    fn from(value: Vec<u8>) -> Self {
        PutValue::Binary(Bytes::from(value))
    }
}

/// Options for `put`. `expiration_ttl` wins over `expiration`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutOptions {
    /// Absolute expiration, Unix seconds.
    pub expiration: Option<Numeric>,
    /// Relative expiration, seconds from now.
    pub expiration_ttl: Option<Numeric>,
    pub metadata: Option<serde_json::Value>,
}

impl PutOptions {
    /// Create options with no expiration and no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire at `unix_seconds`.
    pub fn expiration(mut self, unix_seconds: impl Into<Numeric>) -> Self {
        self.expiration = Some(unix_seconds.into());
        self
    }

    /// Expire `seconds` from now.
    pub fn expiration_ttl(mut self, seconds: impl Into<Numeric>) -> Self {
        self.expiration_ttl = Some(seconds.into());
        self
    }

    /// Attach JSON metadata.
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A caller-supplied number that must normalize to an integer.
///
/// Floats round to the nearest integer. Strings yield their leading base-10
/// integer, so `"60.5"` and `"120s"` read as 60 and 120. A string with no
/// leading digits normalizes to NaN, which then fails range checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    /// Normalize to an integral float, or NaN.
    pub fn normalize(&self) -> f64 {
        match self {
            Numeric::Int(v) => *v as f64,
            Numeric::Float(v) => v.round(),
            Numeric::Text(s) => leading_integer(s).unwrap_or(f64::NAN),
        }
    }
}

/// Leading base-10 integer of `s`, after whitespace and an optional sign.
fn leading_integer(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = s.len() - unsigned.len() + digits;
    s[..end].parse().ok()
}

impl From<i32> for Numeric {
    fn from(v: i32) -> Self {
        Numeric::Int(v.into())
    }
}

impl From<u32> for Numeric {
    fn from(v: u32) -> Self {
        Numeric::Int(v.into())
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Int(v)
    }
}

impl From<u64> for Numeric {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(Numeric::Int)
            .unwrap_or(Numeric::Float(v as f64))
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Float(v)
    }
}

impl From<&str> for Numeric {
    fn from(v: &str) -> Self {
        Numeric::Text(v.to_string())
    }
}

impl From<String> for Numeric {
    fn from(v: String) -> Self {
        Numeric::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tokens() {
        assert_eq!("text".parse::<ValueType>().unwrap(), ValueType::Text);
        assert_eq!("json".parse::<ValueType>().unwrap(), ValueType::Json);
        assert_eq!("arrayBuffer".parse::<ValueType>().unwrap(), ValueType::Bytes);
        assert_eq!("stream".parse::<ValueType>().unwrap(), ValueType::Stream);

        let err = "xml".parse::<ValueType>().unwrap_err();
        assert!(matches!(err, KvError::InvalidArgument(_)));
    }

    #[test]
    fn test_get_options_from_token() {
        let opts = GetOptions::parse("json").unwrap();
        assert_eq!(opts.value_type, ValueType::Json);
        assert!(opts.cache_ttl.is_none());
        assert_eq!(GetOptions::default().value_type, ValueType::Text);
    }

    #[test]
    fn test_numeric_normalize() {
        assert_eq!(Numeric::from(60).normalize(), 60.0);
        assert_eq!(Numeric::from(59.6).normalize(), 60.0);
        assert_eq!(Numeric::from(" 120 ").normalize(), 120.0);
        assert!(Numeric::from("soon").normalize().is_nan());
        assert_eq!(Numeric::from("60.5").normalize(), 60.0);
        assert_eq!(Numeric::from("120s").normalize(), 120.0);
        assert_eq!(Numeric::from("  -30").normalize(), -30.0);
        assert_eq!(Numeric::from("+90").normalize(), 90.0);
        assert!(Numeric::from("-").normalize().is_nan());
        assert!(Numeric::from("").normalize().is_nan());
    }

    #[test]
    fn test_put_value_conversions() {
        assert_eq!(PutValue::from("a"), PutValue::Text("a".to_string()));
        assert!(matches!(PutValue::from(vec![1u8, 2]), PutValue::Binary(_)));

        #[derive(Serialize)]
        struct User {
            name: String,
        }
        let value = PutValue::json(&User {
            name: "a".to_string(),
        })
        .unwrap();
        assert_eq!(value, PutValue::Json(serde_json::json!({"name": "a"})));
    }

    #[tokio::test]
    async fn test_value_stream_read_to_end() {
        let chunks = vec![Ok(Bytes::from("hello ")), Ok(Bytes::from("world"))];
        let stream = ValueStream::new(tokio_stream::iter(chunks));
        assert_eq!(stream.read_to_end().await.unwrap(), Bytes::from("hello world"));
    }
}
