//! Session and identity context for the fixly client stack.
//!
//! [`SessionManager`] owns the connection lifecycle: it logs in, caches
//! the bearer token across runs, resumes cached sessions, and holds the
//! single realtime channel for the authenticated identity.

pub mod cache;
pub mod error;
pub mod manager;

pub use cache::TokenCache;
pub use error::SessionError;
pub use manager::SessionManager;
