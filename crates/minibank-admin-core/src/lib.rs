//! Core library for the Mini Bank admin console.
//!
//! Owns everything about who is signed in: the persisted token, the session
//! manager, the API client that verifies credentials, and the route guard
//! that decides whether the admin shell may render.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routing;
pub mod shell;

pub use api::{ApiClient, ApiError, CredentialVerifier, Credentials};
pub use auth::{
    AuthError, AuthHandle, LoginOutcome, LogoutOutcome, SessionManager, SessionState, TokenStore,
};
pub use config::Config;
pub use routing::{AdminPage, Navigator, Route, View};
pub use shell::{AdminShell, Identity};
