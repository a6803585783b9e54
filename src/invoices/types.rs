use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A cached copy of a remote invoice record.
///
/// Only the identity fields matter to the cache; the business fields
/// (client details, dates, totals, line items, status) ride along opaquely
/// and are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: i64,
  pub invoice_number: String,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_business_fields_survive_roundtrip() {
    let raw = json!({
      "id": 5,
      "invoice_number": "INV-00005",
      "client_name": "Acme",
      "total": 120.5,
      "items": [{"description": "work", "total": 120.5}]
    });

    let invoice: Invoice = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(invoice.id, 5);
    assert_eq!(invoice.invoice_number, "INV-00005");
    assert_eq!(invoice.fields.get("client_name"), Some(&json!("Acme")));

    let back = serde_json::to_value(&invoice).unwrap();
    assert_eq!(back, raw);
  }
}
