//! Local mirror of the remote invoice collection.
//!
//! Updates are confirmed, never optimistic: local state changes only after
//! the remote call succeeds, so on failure the prior state is retained
//! unchanged. No operation retries automatically.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::api::types::{InvoiceEnvelope, InvoiceListEnvelope};
use crate::api::{ApiClient, ApiError};

use super::types::Invoice;

/// Best-effort signal that a list or single fetch is in flight. A UI hint,
/// not a lock: concurrent fetches may race and the flag reflects the most
/// recently settled toggle.
#[derive(Default)]
struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
  /// Raise the flag, returning a guard that lowers it again on drop. The
  /// drop runs on every exit path, success or failure.
  fn begin(&self) -> LoadingGuard {
    self.0.store(true, Ordering::SeqCst);
    LoadingGuard(self.0.clone())
  }

  fn is_set(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
  fn drop(&mut self) {
    self.0.store(false, Ordering::SeqCst);
  }
}

/// Ordered invoice cache plus a current-invoice pointer, kept consistent
/// with server-side CRUD. The collection and the pointer have independent
/// lifecycles; neither invalidates the other.
pub struct InvoiceStore {
  api: ApiClient,
  invoices: Vec<Invoice>,
  current: Option<Invoice>,
  loading: LoadingFlag,
}

impl InvoiceStore {
  pub fn new(api: ApiClient) -> Self {
    Self {
      api,
      invoices: Vec::new(),
      current: None,
      loading: LoadingFlag::default(),
    }
  }

  /// The cached collection, newest first.
  pub fn invoices(&self) -> &[Invoice] {
    &self.invoices
  }

  /// The most recently fetched-by-id record.
  pub fn current(&self) -> Option<&Invoice> {
    self.current.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.loading.is_set()
  }

  /// Fetch the full list and replace the collection wholesale in server
  /// order. On failure the collection is left untouched.
  pub async fn fetch_invoices(&mut self) -> Result<(), ApiError> {
    let _loading = self.loading.begin();
    let envelope: InvoiceListEnvelope = self.api.get_json("/invoices").await?;
    debug!(count = envelope.invoices.len(), "fetched invoice list");
    self.invoices = envelope.invoices;
    Ok(())
  }

  /// Fetch one record by id and point the current-invoice slot at it.
  pub async fn fetch_invoice(&mut self, id: i64) -> Result<Invoice, ApiError> {
    let _loading = self.loading.begin();
    let envelope: InvoiceEnvelope = self.api.get_json(&format!("/invoices/{}", id)).await?;
    self.current = Some(envelope.invoice.clone());
    Ok(envelope.invoice)
  }

  /// Create an invoice and prepend the server-returned record.
  pub async fn create_invoice(&mut self, data: &Value) -> Result<Invoice, ApiError> {
    let envelope: InvoiceEnvelope = self.api.post_json("/invoices", data).await?;
    self.invoices.insert(0, envelope.invoice.clone());
    Ok(envelope.invoice)
  }

  /// Update an invoice. The cached entry with matching id is replaced in
  /// place, order preserved; if no entry matches, the cache is left alone
  /// (the server was still updated).
  pub async fn update_invoice(&mut self, id: i64, data: &Value) -> Result<Invoice, ApiError> {
    let envelope: InvoiceEnvelope = self.api.put_json(&format!("/invoices/{}", id), data).await?;
    if let Some(slot) = self.invoices.iter_mut().find(|inv| inv.id == id) {
      *slot = envelope.invoice.clone();
    }
    Ok(envelope.invoice)
  }

  /// Delete an invoice and drop every cached entry with that id.
  pub async fn delete_invoice(&mut self, id: i64) -> Result<(), ApiError> {
    self.api.delete(&format!("/invoices/{}", id)).await?;
    self.invoices.retain(|inv| inv.id != id);
    Ok(())
  }

  /// Download the PDF rendering of an invoice into `dest_dir`, named after
  /// the invoice number (or `invoice.pdf` as a fallback). The bytes pass
  /// through a temp file that is released on every exit path.
  pub async fn download_pdf(
    &self,
    id: i64,
    invoice_number: Option<&str>,
    dest_dir: &Path,
  ) -> Result<PathBuf, ApiError> {
    let bytes = self
      .api
      .get_bytes(&format!("/invoices/{}/download", id))
      .await?;

    let name = invoice_number.filter(|n| !n.is_empty()).unwrap_or("invoice");
    let dest = dest_dir.join(format!("{}.pdf", name));

    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(&dest).map_err(|e| ApiError::Io(e.error))?;

    Ok(dest)
  }
}
