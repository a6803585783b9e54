//! Session state, persistence, and lifecycle actions.

pub mod state;
mod store;
pub mod types;

pub use state::SessionHandle;
pub use store::SessionStore;
