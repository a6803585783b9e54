//! Error taxonomy for the request pipeline and the stores built on it.

use serde_json::Value;

use crate::vault::VaultError;

/// Errors surfaced by API-backed operations. None of them are retried
/// automatically; every failure is handed to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// The remote service answered 401. The pipeline has already cleared the
  /// session and durable storage and emitted [`SessionEvent::Expired`].
  ///
  /// [`SessionEvent::Expired`]: crate::event::SessionEvent
  #[error("session expired: the service rejected the credential")]
  AuthExpired,

  /// Any other non-2xx response. `payload` holds the service's JSON error
  /// body when one was sent.
  #[error("server error (status {status})")]
  Server { status: u16, payload: Option<Value> },

  /// Network-level failure with no server payload.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// Local misuse detected before any network call.
  #[error("precondition failed: {0}")]
  Precondition(String),

  /// Durable storage failure while persisting session state.
  #[error("storage error: {0}")]
  Storage(#[from] VaultError),

  /// Local file i/o failure (PDF save, logo read).
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

impl ApiError {
  /// The `error` message from the server payload, when present.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      ApiError::Server {
        payload: Some(payload),
        ..
      } => payload.get("error").and_then(Value::as_str),
      _ => None,
    }
  }

  /// The HTTP status of a server-reported failure.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Server { status, .. } => Some(*status),
      ApiError::AuthExpired => Some(401),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_server_message_extraction() {
    let err = ApiError::Server {
      status: 400,
      payload: Some(json!({"error": "Email and password are required"})),
    };
    assert_eq!(err.server_message(), Some("Email and password are required"));
    assert_eq!(err.status(), Some(400));

    let bare = ApiError::Server {
      status: 502,
      payload: None,
    };
    assert_eq!(bare.server_message(), None);
  }
}
