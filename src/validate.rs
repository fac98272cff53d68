//! Input validation. Runs before any request is issued.

use serde_json::Value as Json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{KvError, Result};
use crate::value::{GetOptions, Numeric, PutOptions, PutValue};

/// Maximum key length in bytes (UTF-8).
pub const MAX_KEY_SIZE: usize = 512;

/// Maximum value length in bytes.
pub const MAX_VALUE_SIZE: usize = 25 * 1024 * 1024;

/// Maximum serialized metadata length in bytes.
pub const MAX_METADATA_SIZE: usize = 1024;

/// Shortest accepted expiration, relative or absolute, in seconds.
pub const MIN_EXPIRATION_TTL: i64 = 60;

/// Floor for the (otherwise unused) read cache TTL.
pub const MIN_CACHE_TTL: i64 = 60;

/// Largest page a list call may request; also the default.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// A write that passed validation, in the shape it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedWrite {
    pub value: String,
    pub expiration: Option<i64>,
    pub expiration_ttl: Option<i64>,
    pub metadata: Option<Json>,
}

/// Current Unix time in seconds.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Validate that a key is well-formed.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key == "." || key == ".." {
        return Err(KvError::InvalidArgument(format!(
            "illegal key name {:?}: keys cannot be empty, \".\" or \"..\"",
            key
        )));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(KvError::RequestTooLarge {
            what: "key",
            length: key.len(),
            limit: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Validate read options. Only the cache TTL floor is checked.
pub fn validate_get_options(options: &GetOptions) -> Result<()> {
    if let Some(cache_ttl) = &options.cache_ttl {
        let ttl = cache_ttl.normalize();
        // NaN falls through to the error.
        if !(ttl >= MIN_CACHE_TTL as f64) {
            return Err(KvError::InvalidArgument(format!(
                "cache_ttl must be at least {} seconds, got {}",
                MIN_CACHE_TTL, ttl
            )));
        }
    }
    Ok(())
}

/// Validate a write and resolve its absolute expiration against `now`.
///
/// Checks run in a fixed order: value kind, expiration, value size,
/// metadata size. The first failure wins.
pub fn validate_put(value: &PutValue, options: &PutOptions, now: i64) -> Result<ValidatedWrite> {
    let value = match value {
        PutValue::Text(text) => text.clone(),
        PutValue::Json(json) => serde_json::to_string(json)?,
        PutValue::Binary(_) => {
            return Err(KvError::InvalidArgument(
                "only string and JSON values can be written; binary and stream bodies are not supported"
                    .to_string(),
            ))
        }
    };

    let (expiration, expiration_ttl) = if let Some(ttl) = &options.expiration_ttl {
        let ttl = require_i32("expiration_ttl", ttl)?;
        if ttl <= 0 {
            return Err(KvError::InvalidArgument(format!(
                "expiration_ttl must be a positive integer, got {}",
                ttl
            )));
        }
        if ttl < MIN_EXPIRATION_TTL {
            return Err(KvError::InvalidArgument(format!(
                "expiration_ttl of {} seconds is below the minimum of {} seconds",
                ttl, MIN_EXPIRATION_TTL
            )));
        }
        (Some(now + ttl), Some(ttl))
    } else if let Some(expiration) = &options.expiration {
        let expiration = require_i32("expiration", expiration)?;
        if expiration <= now {
            return Err(KvError::InvalidArgument(format!(
                "expiration {} must be in the future (now {})",
                expiration, now
            )));
        }
        if expiration < now + MIN_EXPIRATION_TTL {
            return Err(KvError::InvalidArgument(format!(
                "expiration {} must be at least {} seconds in the future (now {})",
                expiration, MIN_EXPIRATION_TTL, now
            )));
        }
        (Some(expiration), None)
    } else {
        (None, None)
    };

    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::RequestTooLarge {
            what: "value",
            length: value.len(),
            limit: MAX_VALUE_SIZE,
        });
    }

    if let Some(metadata) = &options.metadata {
        let length = serde_json::to_string(metadata)?.len();
        if length > MAX_METADATA_SIZE {
            return Err(KvError::RequestTooLarge {
                what: "metadata",
                length,
                limit: MAX_METADATA_SIZE,
            });
        }
    }

    Ok(ValidatedWrite {
        value,
        expiration,
        expiration_ttl,
        metadata: options.metadata.clone(),
    })
}

/// Validate a list page size, defaulting to [`MAX_LIST_LIMIT`].
pub fn validate_list_limit(limit: Option<&Numeric>) -> Result<u32> {
    let Some(limit) = limit else {
        return Ok(MAX_LIST_LIMIT);
    };
    let value = limit.normalize();
    if value.is_nan() {
        return Err(KvError::InvalidArgument(format!(
            "list limit must be an integer, got {:?}",
            limit
        )));
    }
    if value < 1.0 {
        return Err(KvError::InvalidArgument(format!(
            "list limit must be at least 1, got {}",
            value
        )));
    }
    if value > MAX_LIST_LIMIT as f64 {
        return Err(KvError::InvalidArgument(format!(
            "list limit must not exceed {}, got {}",
            MAX_LIST_LIMIT, value
        )));
    }
    Ok(value as u32)
}

fn require_i32(name: &str, value: &Numeric) -> Result<i64> {
    let normalized = value.normalize();
    if !(normalized >= i32::MIN as f64 && normalized <= i32::MAX as f64) {
        return Err(KvError::InvalidArgument(format!(
            "{} must be an integer between {} and {}, got {:?}",
            name,
            i32::MIN,
            i32::MAX,
            value
        )));
    }
    Ok(normalized as i64)
}
