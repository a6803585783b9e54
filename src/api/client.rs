//! HTTP request pipeline for the InvoiceGen service.
//!
//! Every outbound call goes through [`ApiClient`]: it attaches the bearer
//! credential when one is held, and reacts to any 401 by clearing the shared
//! session state and durable storage and emitting a session-expired event.
//! Other failures are passed through to the caller unmodified.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::SessionEvent;
use crate::session::state::SessionHandle;
use crate::vault::{keys, Vault};

use super::error::ApiError;

/// Optional upload progress callback, invoked with 0-100 percentages.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Upload stream chunk size.
const UPLOAD_CHUNK: usize = 64 * 1024;

/// API client wrapping all communication with the remote service.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  session: SessionHandle,
  vault: Arc<dyn Vault>,
  events: mpsc::UnboundedSender<SessionEvent>,
}

impl ApiClient {
  /// Create a new client against `base_url` (which carries any path prefix
  /// the deployment uses, e.g. a trailing `/api`).
  pub fn new(
    base_url: &str,
    session: SessionHandle,
    vault: Arc<dyn Vault>,
    events: mpsc::UnboundedSender<SessionEvent>,
  ) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder().build()?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      session,
      vault,
      events,
    })
  }

  /// GET a JSON resource.
  pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    let response = self.dispatch(self.http.get(self.url(path))).await?;
    Ok(response.json().await?)
  }

  /// POST a JSON body and parse a JSON response.
  pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let response = self
      .dispatch(self.http.post(self.url(path)).json(body))
      .await?;
    Ok(response.json().await?)
  }

  /// PUT a JSON body and parse a JSON response.
  pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let response = self
      .dispatch(self.http.put(self.url(path)).json(body))
      .await?;
    Ok(response.json().await?)
  }

  /// DELETE a resource, discarding the response body.
  pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
    self.dispatch(self.http.delete(self.url(path))).await?;
    Ok(())
  }

  /// GET a binary payload (PDF retrieval). The body is never parsed as JSON.
  pub async fn get_bytes(&self, path: &str) -> Result<bytes::Bytes, ApiError> {
    let response = self.dispatch(self.http.get(self.url(path))).await?;
    Ok(response.bytes().await?)
  }

  /// POST a multipart form and parse a JSON response.
  pub async fn post_multipart<T: DeserializeOwned>(
    &self,
    path: &str,
    form: Form,
  ) -> Result<T, ApiError> {
    let response = self
      .dispatch(self.http.post(self.url(path)).multipart(form))
      .await?;
    Ok(response.json().await?)
  }

  /// PUT a multipart form and parse a JSON response.
  pub async fn put_multipart<T: DeserializeOwned>(
    &self,
    path: &str,
    form: Form,
  ) -> Result<T, ApiError> {
    let response = self
      .dispatch(self.http.put(self.url(path)).multipart(form))
      .await?;
    Ok(response.json().await?)
  }

  /// Build a multipart file part that reports upload progress through the
  /// optional callback as chunks are handed to the transport.
  pub fn file_part(
    file_name: String,
    content_type: Option<&str>,
    bytes: Vec<u8>,
    progress: Option<ProgressFn>,
  ) -> Result<Part, ApiError> {
    let total = bytes.len();
    let mut sent = 0usize;

    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
      sent += chunk.len();
      if let Some(report) = &progress {
        let percent = if total == 0 {
          100
        } else {
          (sent * 100 / total) as u8
        };
        report(percent);
      }
      Ok::<_, std::io::Error>(chunk)
    }));

    let mut part =
      Part::stream_with_length(Body::wrap_stream(stream), total as u64).file_name(file_name);
    if let Some(mime) = content_type {
      part = part.mime_str(mime)?;
    }
    Ok(part)
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Attach the bearer credential (when held), send, and map the outcome.
  async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ApiError> {
    let request = match self.session.token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    debug!(status = %status, url = %response.url(), "api response");

    if status == StatusCode::UNAUTHORIZED {
      self.expire_session();
      return Err(ApiError::AuthExpired);
    }

    if !status.is_success() {
      let payload = response.json::<Value>().await.ok();
      return Err(ApiError::Server {
        status: status.as_u16(),
        payload,
      });
    }

    Ok(response)
  }

  /// Unconditional 401 side effect: clear the shared session and durable
  /// storage, then notify the navigation owner.
  fn expire_session(&self) {
    warn!("credential rejected by the service; clearing session");
    self.session.clear();

    for key in [keys::TOKEN, keys::USER] {
      if let Err(err) = self.vault.delete(key) {
        warn!(key, %err, "failed to clear vault entry on expiry");
      }
    }

    // The app layer may have shut down already; expiry still holds.
    let _ = self.events.send(SessionEvent::Expired);
  }
}
