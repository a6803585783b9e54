//! Client-side session and invoice cache for the InvoiceGen service.
//!
//! The core is three pieces: the authenticated request pipeline
//! ([`api::ApiClient`]), the session store ([`session::SessionStore`]) with
//! durable persistence behind the [`vault::Vault`] trait, and the invoice
//! cache ([`invoices::InvoiceStore`]). The [`guard`] module decides
//! navigation; [`app`] and [`cli`] wrap everything in a command-line tool.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod event;
pub mod guard;
pub mod invoices;
pub mod session;
pub mod vault;
