//! Authenticated request pipeline for the InvoiceGen service.

mod client;
mod error;
pub mod types;

pub use client::{ApiClient, ProgressFn};
pub use error::ApiError;
