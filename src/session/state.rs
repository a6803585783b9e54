//! Shared in-memory session state.
//!
//! The request pipeline and the session store observe the same state through
//! a cloned handle, so a 401 detected deep in the pipeline is immediately
//! visible to every consumer. Credential and profile live under one lock and
//! are always cleared together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::types::UserProfile;

#[derive(Debug, Default)]
struct SessionInner {
  token: Option<String>,
  user: Option<UserProfile>,
}

/// Cloneable handle to the session state.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
  inner: Arc<Mutex<SessionInner>>,
}

impl SessionHandle {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, SessionInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The current bearer credential, if any.
  pub fn token(&self) -> Option<String> {
    self.lock().token.clone()
  }

  /// The current user profile, if any.
  pub fn user(&self) -> Option<UserProfile> {
    self.lock().user.clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.lock().token.is_some()
  }

  /// Atomically install a credential and profile (login/signup success,
  /// or restore from durable storage).
  pub fn set_authenticated(&self, token: String, user: Option<UserProfile>) {
    let mut inner = self.lock();
    inner.token = Some(token);
    inner.user = user;
  }

  /// Replace the profile wholesale, keeping the credential.
  pub fn replace_user(&self, user: UserProfile) {
    self.lock().user = Some(user);
  }

  /// Mutate the profile in place, creating an empty one if none exists.
  /// Returns a copy of the result for persistence.
  pub fn update_user(&self, mutate: impl FnOnce(&mut UserProfile)) -> UserProfile {
    let mut inner = self.lock();
    let user = inner.user.get_or_insert_with(UserProfile::default);
    mutate(user);
    user.clone()
  }

  /// Drop the credential and profile together (logout or expiry).
  pub fn clear(&self) {
    let mut inner = self.lock();
    inner.token = None;
    inner.user = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_authenticated_then_clear() {
    let session = SessionHandle::new();
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);

    session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile {
        full_name: Some("A".to_string()),
        ..Default::default()
      }),
    );
    assert!(session.is_authenticated());
    assert_eq!(session.token(), Some("T1".to_string()));

    session.clear();
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
  }

  #[test]
  fn test_update_user_creates_profile_when_absent() {
    let session = SessionHandle::new();
    let user = session.update_user(|u| u.company_logo = Some("uploads/logo.png".to_string()));
    assert_eq!(user.company_logo.as_deref(), Some("uploads/logo.png"));
    assert_eq!(session.user(), Some(user));
  }

  #[test]
  fn test_update_user_keeps_other_fields() {
    let session = SessionHandle::new();
    session.set_authenticated(
      "T1".to_string(),
      Some(UserProfile {
        full_name: Some("A".to_string()),
        ..Default::default()
      }),
    );

    let user = session.update_user(|u| u.company_logo = Some("uploads/logo.png".to_string()));
    assert_eq!(user.full_name.as_deref(), Some("A"));
    assert_eq!(user.company_logo.as_deref(), Some("uploads/logo.png"));
  }
}
