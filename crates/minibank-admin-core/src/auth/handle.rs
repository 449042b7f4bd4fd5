use std::sync::Arc;

use tokio::sync::watch;

use super::error::AuthError;
use super::session::{LoginOutcome, LogoutOutcome, SessionManager, SessionState};

/// What the rest of the application may depend on: the current token and
/// authentication flag, plus login and logout.
///
/// Cheap to clone; all clones share one `SessionManager`.
#[derive(Clone)]
pub struct AuthHandle {
    manager: Arc<SessionManager>,
}

impl AuthHandle {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }

    pub fn state(&self) -> SessionState {
        self.manager.current_state()
    }

    pub fn token(&self) -> Option<String> {
        self.state().token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        self.manager.login(email, password).await
    }

    pub fn logout(&self) -> LogoutOutcome {
        self.manager.logout()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.manager.subscribe()
    }

    /// A handle that can only log out, for components that must not log in.
    pub fn logout_handle(&self) -> LogoutHandle {
        LogoutHandle {
            manager: Arc::clone(&self.manager),
        }
    }
}

/// Bound logout action handed to the admin shell.
#[derive(Clone)]
pub struct LogoutHandle {
    manager: Arc<SessionManager>,
}

impl LogoutHandle {
    pub fn logout(&self) -> LogoutOutcome {
        self.manager.logout()
    }
}
