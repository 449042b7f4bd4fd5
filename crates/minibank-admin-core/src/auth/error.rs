use thiserror::Error;

use crate::api::ApiError;

use super::token_store::StorageError;

/// Failure outcomes of the session layer. None of them is fatal; the
/// session state is left as it was for every variant except
/// `StorageUnavailable`, reported alongside a live session, and
/// `TokenNotCleared`, reported after a logout.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[source] ApiError),

    #[error("Login response did not contain a token")]
    InvalidCredentialResponse,

    #[error("Session could not be saved: {0}")]
    StorageUnavailable(#[source] StorageError),

    #[error("A login attempt is already in progress")]
    LoginInProgress,

    #[error("Saved session could not be removed: {0}")]
    TokenNotCleared(#[source] StorageError),
}

impl AuthError {
    /// Text shown to the user, on the login form or in the status bar.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::AuthenticationFailed(ApiError::Unauthorized(msg))
            | AuthError::AuthenticationFailed(ApiError::AccessDenied(msg)) => {
                if msg.is_empty() {
                    "Invalid email or password".to_string()
                } else {
                    msg.clone()
                }
            }
            AuthError::AuthenticationFailed(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::AuthenticationFailed(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            AuthError::AuthenticationFailed(ApiError::RateLimited) => {
                "Too many attempts. Please wait and try again.".to_string()
            }
            AuthError::AuthenticationFailed(e) => format!("Login failed: {}", e),
            AuthError::InvalidCredentialResponse => {
                "Login failed: the server did not return a session token.".to_string()
            }
            AuthError::StorageUnavailable(_) => {
                "Signed in, but the session could not be saved and will end when you quit.".to_string()
            }
            AuthError::LoginInProgress => "Signing in, please wait...".to_string(),
            AuthError::TokenNotCleared(_) => {
                "Signed out, but the saved session could not be removed and may be restored on the next start.".to_string()
            }
        }
    }
}
