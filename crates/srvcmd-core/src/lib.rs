//! # ServerCommander – Core
//!
//! Shared building blocks for the ServerCommander crates:
//!   • Stored connection profiles (`Session`) and their JSON registry
//!   • Configuration directory resolution
//!
//! Secrets are never part of a `Session`; passwords are supplied at call time.

pub mod error;
pub mod paths;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use session::{AuthMethod, Protocol, Session, SessionStore};
