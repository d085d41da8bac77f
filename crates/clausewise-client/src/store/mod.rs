//! Stores owning client-side state.
//!
//! Each store is an explicit object created at application start and passed
//! by reference to whatever drives it. State lives behind a lock that is
//! held only for synchronous mutation steps, never across an `.await`.

mod auth;
mod documents;

pub use auth::{AuthPhase, AuthState, AuthStore};
pub use documents::{DocumentState, DocumentStore};
