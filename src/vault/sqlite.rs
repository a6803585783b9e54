//! SQLite-backed vault implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Vault, VaultError};

/// Schema for the vault table.
const VAULT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS vault (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-based durable storage.
pub struct SqliteVault {
  conn: Mutex<Connection>,
}

impl SqliteVault {
  /// Open or create the vault at the default location.
  pub fn open() -> Result<Self, VaultError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create a vault at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self, VaultError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| VaultError::Backend(format!("failed to create vault directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      VaultError::Backend(format!("failed to open vault at {}: {}", path.display(), e))
    })?;

    let vault = Self {
      conn: Mutex::new(conn),
    };
    vault.run_migrations()?;

    Ok(vault)
  }

  /// Get the default vault path.
  fn default_path() -> Result<PathBuf, VaultError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| VaultError::Backend("could not determine data directory".to_string()))?;

    Ok(data_dir.join("invogen").join("session.db"))
  }

  fn run_migrations(&self) -> Result<(), VaultError> {
    let conn = self.lock()?;
    conn
      .execute_batch(VAULT_SCHEMA)
      .map_err(|e| VaultError::Backend(format!("failed to run migrations: {}", e)))?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, VaultError> {
    self
      .conn
      .lock()
      .map_err(|e| VaultError::Backend(format!("lock poisoned: {}", e)))
  }
}

impl Vault for SqliteVault {
  fn put(&self, key: &str, value: &str) -> Result<(), VaultError> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO vault (key, value, stored_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| VaultError::Backend(format!("failed to store {}: {}", key, e)))?;
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
    let conn = self.lock()?;
    conn
      .query_row("SELECT value FROM vault WHERE key = ?", params![key], |row| {
        row.get(0)
      })
      .optional()
      .map_err(|e| VaultError::Backend(format!("failed to read {}: {}", key, e)))
  }

  fn delete(&self, key: &str) -> Result<(), VaultError> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM vault WHERE key = ?", params![key])
      .map_err(|e| VaultError::Backend(format!("failed to delete {}: {}", key, e)))?;
    Ok(())
  }

  fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, VaultError> {
    let conn = self.lock()?;
    let stored: Option<String> = conn
      .query_row(
        "SELECT stored_at FROM vault WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| VaultError::Backend(format!("failed to read {}: {}", key, e)))?;

    stored.map(|s| parse_datetime(&s)).transpose()
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, VaultError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| VaultError::Backend(format!("failed to parse datetime '{}': {}", s, e)))
}
