//! REST API client module for the Mini Bank backend.
//!
//! This module provides the `ApiClient` for talking to the user service,
//! and the `CredentialVerifier` seam the session layer authenticates through.
//!
//! Authenticated calls carry the session's opaque token as a bearer header.

pub mod client;
pub mod error;
pub mod verifier;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
pub use verifier::{CredentialVerifier, Credentials};
