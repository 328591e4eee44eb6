//! Shared response handling: status check, error envelope, body decode.

use elasticsearch::http::response::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::error;

use crate::error::{EsError, Result};

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detail {
        #[serde(rename = "type")]
        error_type: String,
        #[serde(default)]
        reason: Option<String>,
    },
    // Some proxies and older engines reply with a plain message
    Message(String),
}

/// Read the whole body and decode it as `T`.
///
/// The response is consumed on every path, so its connection is returned to
/// the pool whether decoding succeeds or not.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status_code();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(engine_error(status.as_u16(), &body));
    }

    serde_json::from_slice(&body).map_err(|e| {
        error!("Error parsing the response body: {}", e);
        EsError::Decode(e)
    })
}

/// Turn a non-2xx body into an engine error, or a decode error if the body is
/// not an error envelope.
pub(crate) fn engine_error(status: u16, body: &[u8]) -> EsError {
    let envelope: ErrorEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Error parsing the error response body: {}", e);
            return EsError::Decode(e);
        }
    };

    let (error_type, reason) = match envelope.error {
        ErrorBody::Detail { error_type, reason } => (error_type, reason.unwrap_or_default()),
        ErrorBody::Message(message) => (String::new(), message),
    };

    error!("[{}] {}: {}", status, error_type, reason);

    EsError::Engine {
        status,
        error_type,
        reason,
    }
}
