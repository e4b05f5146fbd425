//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `CredentialStore`: Persistence of the bearer token (keychain, file, memory)
//! - `SessionHandle`: Completion-gated broadcast of the resolved identity
//! - `SessionManager`: Sign-in, sign-up, sign-out and lazy identity lookup

pub mod credentials;
pub mod handle;
pub mod session;

pub use credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore};
pub use handle::{Identity, SessionHandle};
pub use session::{SessionEvent, SessionManager, SessionState};
