//! Durable key-value storage for session state.
//!
//! The session layer persists the credential and the user profile under two
//! independent keys so they survive process restarts. Absence of a key means
//! "no value". Writes happen synchronously, immediately after the matching
//! in-memory mutation.

mod sqlite;

pub use sqlite::SqliteVault;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known vault keys.
pub mod keys {
  /// Bearer token for the current session.
  pub const TOKEN: &str = "token";
  /// Serialized user profile (JSON).
  pub const USER: &str = "user";
}

/// Vault errors.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
  /// The storage backend failed.
  #[error("storage backend error: {0}")]
  Backend(String),

  /// A stored value could not be encoded or decoded.
  #[error("stored value could not be decoded: {0}")]
  Codec(#[from] serde_json::Error),
}

/// Trait for durable key-value storage backends.
pub trait Vault: Send + Sync {
  /// Store a value under a key, replacing any previous value.
  fn put(&self, key: &str, value: &str) -> Result<(), VaultError>;

  /// Get the value for a key, or None if absent.
  fn get(&self, key: &str) -> Result<Option<String>, VaultError>;

  /// Remove a key. Removing an absent key is a no-op.
  fn delete(&self, key: &str) -> Result<(), VaultError>;

  /// When the value for a key was last written, or None if absent.
  fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, VaultError>;
}

/// In-memory vault. Used in tests and wherever persistence across restarts
/// is not wanted.
#[derive(Default)]
pub struct MemoryVault {
  entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryVault {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, DateTime<Utc>)>> {
    self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }
}

impl Vault for MemoryVault {
  fn put(&self, key: &str, value: &str) -> Result<(), VaultError> {
    self
      .lock()
      .insert(key.to_string(), (value.to_string(), Utc::now()));
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
    Ok(self.lock().get(key).map(|(value, _)| value.clone()))
  }

  fn delete(&self, key: &str) -> Result<(), VaultError> {
    self.lock().remove(key);
    Ok(())
  }

  fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, VaultError> {
    Ok(self.lock().get(key).map(|(_, at)| *at))
  }
}
