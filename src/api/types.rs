//! JSON envelopes used by the InvoiceGen service.

use serde::Deserialize;

use crate::invoices::types::Invoice;
use crate::session::types::UserProfile;

/// Response to a successful login or signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
  pub access_token: String,
  pub user: UserProfile,
  #[serde(default)]
  pub message: Option<String>,
}

/// `{"user": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
  pub user: UserProfile,
}

/// `{"invoices": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceListEnvelope {
  pub invoices: Vec<Invoice>,
}

/// `{"invoice": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceEnvelope {
  pub invoice: Invoice,
}
