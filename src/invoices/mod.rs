//! Invoice records and the local cache that mirrors them.

mod store;
pub mod types;

pub use store::InvoiceStore;
pub use types::Invoice;
