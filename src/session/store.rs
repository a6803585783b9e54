//! Session lifecycle: login, signup, logout, profile and logo management.
//!
//! Every credential/profile mutation is followed synchronously by the
//! matching vault write (or deletion) before the action returns, so memory
//! and durable storage never diverge.

use std::sync::Arc;

use reqwest::multipart::Form;
use serde_json::Value;
use tracing::info;

use crate::api::types::{AuthResponse, UserEnvelope};
use crate::api::{ApiClient, ApiError, ProgressFn};
use crate::vault::{keys, Vault, VaultError};

use super::state::SessionHandle;
use super::types::{LoginCredentials, LogoFile, ProfileUpdate, SignupData, UserProfile};

/// Store owning the session lifecycle. State itself lives in the shared
/// [`SessionHandle`] so the request pipeline observes the same truth.
pub struct SessionStore {
  api: ApiClient,
  session: SessionHandle,
  vault: Arc<dyn Vault>,
}

impl SessionStore {
  pub fn new(api: ApiClient, session: SessionHandle, vault: Arc<dyn Vault>) -> Self {
    Self {
      api,
      session,
      vault,
    }
  }

  /// Load a persisted session from the vault at startup.
  ///
  /// A stale profile with no matching credential is discarded (and removed
  /// from the vault) rather than restored.
  pub fn restore(&self) -> Result<(), VaultError> {
    let token = self.vault.get(keys::TOKEN)?;
    let user = match self.vault.get(keys::USER)? {
      Some(raw) => Some(serde_json::from_str::<UserProfile>(&raw)?),
      None => None,
    };

    match token {
      Some(token) => {
        self.session.set_authenticated(token, user);
        info!("restored persisted session");
      }
      None if user.is_some() => {
        self.vault.delete(keys::USER)?;
      }
      None => {}
    }
    Ok(())
  }

  pub fn is_authenticated(&self) -> bool {
    self.session.is_authenticated()
  }

  pub fn user(&self) -> Option<UserProfile> {
    self.session.user()
  }

  /// Authenticate with email and password. On success the credential and
  /// profile are installed and persisted atomically; on failure the session
  /// is left unchanged.
  pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
    let response: AuthResponse = self.api.post_json("/auth/login", credentials).await?;
    self.establish(&response)?;
    Ok(response)
  }

  /// Register a new account; contract identical to [`login`](Self::login).
  pub async fn signup(&self, data: &SignupData) -> Result<AuthResponse, ApiError> {
    let response: AuthResponse = self.api.post_json("/auth/signup", data).await?;
    self.establish(&response)?;
    Ok(response)
  }

  fn establish(&self, response: &AuthResponse) -> Result<(), ApiError> {
    self
      .session
      .set_authenticated(response.access_token.clone(), Some(response.user.clone()));
    self.vault.put(keys::TOKEN, &response.access_token)?;
    self.persist_user(&response.user)?;
    Ok(())
  }

  /// Drop the session in memory and in durable storage. Safe to call while
  /// anonymous; no network traffic.
  pub fn logout(&self) -> Result<(), ApiError> {
    self.session.clear();
    self.vault.delete(keys::TOKEN)?;
    self.vault.delete(keys::USER)?;
    Ok(())
  }

  /// Refresh the profile from the service and persist it.
  pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
    let envelope: UserEnvelope = self.api.get_json("/auth/me").await?;
    self.session.replace_user(envelope.user.clone());
    self.persist_user(&envelope.user)?;
    Ok(envelope.user)
  }

  /// Update profile fields, optionally attaching a new logo. Sent as
  /// multipart so the file can ride along; the response profile replaces
  /// the cached one wholesale.
  pub async fn update_profile(
    &self,
    update: &ProfileUpdate,
    logo: Option<LogoFile>,
  ) -> Result<UserProfile, ApiError> {
    let mut form = Form::new();
    for (name, value) in [
      ("email", &update.email),
      ("password", &update.password),
      ("full_name", &update.full_name),
      ("company_name", &update.company_name),
      ("address", &update.address),
      ("phone", &update.phone),
    ] {
      if let Some(value) = value {
        form = form.text(name, value.clone());
      }
    }
    if let Some(file) = logo {
      let part =
        ApiClient::file_part(file.file_name, file.content_type.as_deref(), file.bytes, None)?;
      form = form.part("logo", part);
    }

    let envelope: UserEnvelope = self.api.put_multipart("/auth/profile", form).await?;
    self.session.replace_user(envelope.user.clone());
    self.persist_user(&envelope.user)?;
    Ok(envelope.user)
  }

  /// Upload a company logo. Fails before any network call when no file is
  /// supplied. On success the returned `logo_path` is merged into the
  /// profile without touching other fields, and the result is persisted.
  /// Returns the raw response payload.
  pub async fn upload_logo(
    &self,
    file: Option<LogoFile>,
    progress: Option<ProgressFn>,
  ) -> Result<Value, ApiError> {
    let file =
      file.ok_or_else(|| ApiError::Precondition("no file supplied for upload".to_string()))?;

    let part = ApiClient::file_part(
      file.file_name,
      file.content_type.as_deref(),
      file.bytes,
      progress,
    )?;
    let form = Form::new().part("logo", part);

    let payload: Value = self.api.post_multipart("/upload/logo", form).await?;

    if let Some(logo_path) = payload.get("logo_path").and_then(Value::as_str) {
      let user = self
        .session
        .update_user(|u| u.company_logo = Some(logo_path.to_string()));
      self.persist_user(&user)?;
    }

    Ok(payload)
  }

  /// Clear the logo field locally and persist the change. No remote
  /// endpoint is wired in; the operation always succeeds.
  pub fn remove_logo(&self) -> Result<(), ApiError> {
    if self.session.user().is_some() {
      let user = self.session.update_user(|u| u.company_logo = None);
      self.persist_user(&user)?;
    }
    Ok(())
  }

  fn persist_user(&self, user: &UserProfile) -> Result<(), VaultError> {
    let raw = serde_json::to_string(user)?;
    self.vault.put(keys::USER, &raw)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::SessionEvents;
  use crate::vault::MemoryVault;
  use serde_json::json;
  use wiremock::matchers::{body_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  struct Harness {
    store: SessionStore,
    session: SessionHandle,
    vault: Arc<MemoryVault>,
    #[allow(dead_code)]
    events: SessionEvents,
  }

  fn harness(base_url: &str) -> Harness {
    let session = SessionHandle::new();
    let vault = Arc::new(MemoryVault::new());
    let (tx, events) = SessionEvents::channel();
    let api = ApiClient::new(base_url, session.clone(), vault.clone(), tx).unwrap();
    let store = SessionStore::new(api, session.clone(), vault.clone());
    Harness {
      store,
      session,
      vault,
      events,
    }
  }

  fn auth_body(token: &str, name: &str) -> Value {
    json!({
      "message": "Login successful",
      "access_token": token,
      "user": {"id": 1, "email": "a@b.com", "full_name": name}
    })
  }

  #[tokio::test]
  async fn test_login_installs_and_persists_credential_and_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .and(body_json(json!({"email": "a@b.com", "password": "x"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "A")))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    let response = h
      .store
      .login(&LoginCredentials {
        email: "a@b.com".to_string(),
        password: "x".to_string(),
      })
      .await
      .unwrap();

    assert_eq!(response.access_token, "T1");
    assert_eq!(h.session.token(), Some("T1".to_string()));
    assert_eq!(h.session.user().unwrap().full_name.as_deref(), Some("A"));

    assert_eq!(h.vault.get(keys::TOKEN).unwrap(), Some("T1".to_string()));
    let stored: UserProfile =
      serde_json::from_str(&h.vault.get(keys::USER).unwrap().unwrap()).unwrap();
    assert_eq!(stored.full_name.as_deref(), Some("A"));
  }

  #[tokio::test]
  async fn test_failed_login_leaves_session_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad request"})))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    let result = h
      .store
      .login(&LoginCredentials {
        email: "a@b.com".to_string(),
        password: "".to_string(),
      })
      .await;

    assert!(matches!(result, Err(ApiError::Server { status: 400, .. })));
    assert!(!h.store.is_authenticated());
    assert_eq!(h.vault.get(keys::TOKEN).unwrap(), None);
  }

  #[tokio::test]
  async fn test_signup_behaves_like_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/signup"))
      .respond_with(ResponseTemplate::new(201).set_body_json(auth_body("T2", "B")))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    h.store
      .signup(&SignupData {
        email: "b@c.com".to_string(),
        password: "y".to_string(),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(h.session.token(), Some("T2".to_string()));
    assert_eq!(h.vault.get(keys::TOKEN).unwrap(), Some("T2".to_string()));
  }

  #[tokio::test]
  async fn test_logout_clears_memory_and_storage() {
    let h = harness("http://127.0.0.1:9");
    h.session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile::default()),
    );
    h.vault.put(keys::TOKEN, "T1").unwrap();
    h.vault.put(keys::USER, "{}").unwrap();

    h.store.logout().unwrap();

    assert!(!h.store.is_authenticated());
    assert_eq!(h.store.user(), None);
    assert_eq!(h.vault.get(keys::TOKEN).unwrap(), None);
    assert_eq!(h.vault.get(keys::USER).unwrap(), None);

    // Logging out while anonymous is a no-op.
    h.store.logout().unwrap();
  }

  #[tokio::test]
  async fn test_restore_rehydrates_session() {
    let h = harness("http://127.0.0.1:9");
    h.vault.put(keys::TOKEN, "T1").unwrap();
    h.vault
      .put(keys::USER, r#"{"id":1,"full_name":"A"}"#)
      .unwrap();

    h.store.restore().unwrap();
    assert_eq!(h.session.token(), Some("T1".to_string()));
    assert_eq!(h.session.user().unwrap().full_name.as_deref(), Some("A"));
  }

  #[tokio::test]
  async fn test_restore_discards_profile_without_credential() {
    let h = harness("http://127.0.0.1:9");
    h.vault.put(keys::USER, r#"{"id":1}"#).unwrap();

    h.store.restore().unwrap();
    assert!(!h.store.is_authenticated());
    assert_eq!(h.store.user(), None);
    assert_eq!(h.vault.get(keys::USER).unwrap(), None);
  }

  #[tokio::test]
  async fn test_upload_logo_without_file_is_precondition_error() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());

    let result = h.store.upload_logo(None, None).await;
    assert!(matches!(result, Err(ApiError::Precondition(_))));

    // No network call was made.
    assert!(server.received_requests().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_upload_logo_merges_path_preserving_other_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/upload/logo"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "message": "Logo uploaded",
        "logo_path": "uploads/logos/user_1_logo.png"
      })))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    h.session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile {
        full_name: Some("A".to_string()),
        ..Default::default()
      }),
    );

    let file = LogoFile {
      file_name: "logo.png".to_string(),
      content_type: Some("image/png".to_string()),
      bytes: vec![1, 2, 3],
    };
    let payload = h.store.upload_logo(Some(file), None).await.unwrap();
    assert_eq!(
      payload.get("logo_path").and_then(Value::as_str),
      Some("uploads/logos/user_1_logo.png")
    );

    let user = h.store.user().unwrap();
    assert_eq!(user.full_name.as_deref(), Some("A"));
    assert_eq!(user.company_logo.as_deref(), Some("uploads/logos/user_1_logo.png"));

    let stored: UserProfile =
      serde_json::from_str(&h.vault.get(keys::USER).unwrap().unwrap()).unwrap();
    assert_eq!(stored.company_logo.as_deref(), Some("uploads/logos/user_1_logo.png"));
  }

  #[tokio::test]
  async fn test_upload_logo_without_path_in_response_leaves_profile_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/upload/logo"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    let file = LogoFile {
      file_name: "logo.png".to_string(),
      content_type: None,
      bytes: vec![1],
    };
    h.store.upload_logo(Some(file), None).await.unwrap();
    assert_eq!(h.store.user(), None);
  }

  #[tokio::test]
  async fn test_remove_logo_clears_field_and_persists() {
    let h = harness("http://127.0.0.1:9");
    h.session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile {
        full_name: Some("A".to_string()),
        company_logo: Some("uploads/logo.png".to_string()),
        ..Default::default()
      }),
    );

    h.store.remove_logo().unwrap();

    let user = h.store.user().unwrap();
    assert_eq!(user.company_logo, None);
    assert_eq!(user.full_name.as_deref(), Some("A"));

    let stored: UserProfile =
      serde_json::from_str(&h.vault.get(keys::USER).unwrap().unwrap()).unwrap();
    assert_eq!(stored.company_logo, None);
  }

  #[tokio::test]
  async fn test_remove_logo_is_noop_without_profile() {
    let h = harness("http://127.0.0.1:9");
    h.store.remove_logo().unwrap();
    assert_eq!(h.store.user(), None);
    assert_eq!(h.vault.get(keys::USER).unwrap(), None);
  }

  #[tokio::test]
  async fn test_fetch_profile_replaces_wholesale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/auth/me"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "user": {"id": 1, "email": "new@b.com", "full_name": "Renamed"}
      })))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    h.session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile {
        full_name: Some("Old".to_string()),
        phone: Some("123".to_string()),
        ..Default::default()
      }),
    );

    let user = h.store.fetch_profile().await.unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Renamed"));
    // Wholesale replacement: fields absent from the response are gone.
    assert_eq!(h.store.user().unwrap().phone, None);
  }

  #[tokio::test]
  async fn test_update_profile_sends_only_provided_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/auth/profile"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "message": "Profile updated successfully",
        "user": {"id": 1, "email": "a@b.com", "full_name": "New Name"}
      })))
      .mount(&server)
      .await;

    let h = harness(&server.uri());
    h.session.set_authenticated("T1".to_string(), Some(UserProfile::default()));

    let user = h
      .store
      .update_profile(
        &ProfileUpdate {
          full_name: Some("New Name".to_string()),
          ..Default::default()
        },
        None,
      )
      .await
      .unwrap();
    assert_eq!(user.full_name.as_deref(), Some("New Name"));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("full_name"));
    assert!(!body.contains("phone"));
  }
}
