//! Authentication module for the admin session.
//!
//! This module provides:
//! - `TokenStore`: persistence of the single opaque token (file, keychain, memory)
//! - `SessionManager`: login/logout and the published session state
//! - `AuthHandle`: the consumer surface handed to the rest of the application
//!
//! Tokens are opaque and carry no expiry; a session lasts until logout.

pub mod error;
pub mod extract;
pub mod handle;
pub mod session;
pub mod token_store;

pub use error::AuthError;
pub use extract::extract_token;
pub use handle::{AuthHandle, LogoutHandle};
pub use session::{LoginOutcome, LogoutOutcome, SessionManager, SessionState};
pub use token_store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, StorageError, TokenBackend, TokenStore,
    TOKEN_KEY,
};
