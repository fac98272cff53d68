//! Response decoding: value representations, metadata, and status checks.

use bytes::Bytes;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value as Json;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::error::{KvError, Result};
use crate::value::{Value, ValueStream, ValueType};

/// `{"result": ...}` envelope around metadata responses.
#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    result: Option<Json>,
}

/// `{"errors": [{"code": ..., "message": ...}]}` envelope on failures.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Decode a value response. A 404 is `None`, not an error.
///
/// Other failure statuses surface through the transport's own status
/// check.
pub(crate) async fn decode_value(response: Response, value_type: ValueType) -> Result<Option<Value>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = response.error_for_status()?;

    let value = match value_type {
        ValueType::Text => Value::Text(response.text().await?),
        ValueType::Json => Value::Json(serde_json::from_slice(&response.bytes().await?)?),
        ValueType::Bytes => Value::Bytes(response.bytes().await?),
        ValueType::Stream => Value::Stream(ValueStream::new(
            response.bytes_stream().map(|chunk| chunk.map_err(KvError::from)),
        )),
    };
    Ok(Some(value))
}

/// Decode a metadata response. A 404 or a `null` result is `None`.
pub(crate) async fn decode_metadata(response: Response) -> Result<Option<Json>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = check_status(response).await?;
    let envelope: ResultEnvelope = serde_json::from_slice(&response.bytes().await?)?;
    Ok(envelope.result.filter(|metadata| !metadata.is_null()))
}

/// Decode a value held as its stored string form.
pub(crate) fn decode_stored(stored: &str, value_type: ValueType) -> Result<Value> {
    Ok(match value_type {
        ValueType::Text => Value::Text(stored.to_string()),
        ValueType::Json => Value::Json(serde_json::from_str(stored)?),
        ValueType::Bytes => Value::Bytes(Bytes::copy_from_slice(stored.as_bytes())),
        ValueType::Stream => Value::Stream(ValueStream::once(Bytes::copy_from_slice(stored.as_bytes()))),
    })
}

/// Pass a successful response through, or turn it into `RemoteFailure`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = remote_message(status, &body);
    warn!(status = status.as_u16(), path = url.path(), "namespace API returned {}", message);

    Err(KvError::RemoteFailure {
        status: status.as_u16(),
        message,
    })
}

/// Pull the human-readable part out of an error body.
fn remote_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let messages: Vec<String> = envelope
            .errors
            .into_iter()
            .map(|e| match e.code {
                Some(code) => format!("{} ({})", e.message, code),
                None => e.message,
            })
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}
