//! The session manager: single source of truth for whether this
//! application instance is authenticated, and with which token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{CredentialVerifier, Credentials};

use super::error::AuthError;
use super::extract::{extract_token, response_keys};
use super::token_store::{StorageError, TokenStore};

/// Immutable snapshot of the session.
///
/// An empty token is normalized to `None`, so `is_authenticated` can only
/// ever be derived from the token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    token: Option<String>,
}

impl SessionState {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn unauthenticated() -> Self {
        Self { token: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Result of a login that reached the authenticated state.
#[must_use = "a session-only login must be reported to the user"]
#[derive(Debug)]
pub enum LoginOutcome {
    /// Token saved; the session survives a restart.
    Persisted,
    /// Token could not be saved; the session ends with this process.
    SessionOnly(StorageError),
}

impl LoginOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, LoginOutcome::Persisted)
    }

    /// The `StorageUnavailable` condition for a session-only login.
    pub fn into_warning(self) -> Option<AuthError> {
        match self {
            LoginOutcome::Persisted => None,
            LoginOutcome::SessionOnly(e) => Some(AuthError::StorageUnavailable(e)),
        }
    }
}

/// Result of a logout. The session is unauthenticated either way.
#[must_use = "a token left in storage must be reported to the user"]
#[derive(Debug)]
pub enum LogoutOutcome {
    /// Stored token removed.
    Cleared,
    /// Stored token could not be removed and may be restored on next start.
    TokenRetained(StorageError),
}

impl LogoutOutcome {
    pub fn is_cleared(&self) -> bool {
        matches!(self, LogoutOutcome::Cleared)
    }

    /// The `TokenNotCleared` condition for a logout that left the token behind.
    pub fn into_warning(self) -> Option<AuthError> {
        match self {
            LogoutOutcome::Cleared => None,
            LogoutOutcome::TokenRetained(e) => Some(AuthError::TokenNotCleared(e)),
        }
    }
}

/// Marks a login as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    verifier: Arc<dyn CredentialVerifier>,
    state: watch::Sender<SessionState>,
    login_in_flight: AtomicBool,
}

impl SessionManager {
    /// Seed the session from the token store. Reads the store once and
    /// makes no network call.
    pub fn new(store: Arc<dyn TokenStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let initial = SessionState::new(store.read());
        debug!(authenticated = initial.is_authenticated(), "Session seeded from token store");

        let (state, _) = watch::channel(initial);

        Self {
            store,
            verifier,
            state,
            login_in_flight: AtomicBool::new(false),
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every change of session state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Exchange credentials for a token and enter the authenticated state.
    ///
    /// Only one login may be in flight; a concurrent call fails with
    /// `LoginInProgress` without reaching the verifier. On every error the
    /// session is left untouched. The token is written to the store before
    /// the new state is published.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let _in_flight = InFlight::acquire(&self.login_in_flight).ok_or_else(|| {
            debug!("Login rejected, another attempt is in flight");
            AuthError::LoginInProgress
        })?;

        let credentials = Credentials::new(email, password);
        let response = self.verifier.verify(&credentials).await.map_err(|e| {
            warn!(error = %e, "Credential verification failed");
            AuthError::AuthenticationFailed(e)
        })?;

        let token = extract_token(&response).ok_or_else(|| {
            error!(keys = ?response_keys(&response), "Login response had no usable token");
            AuthError::InvalidCredentialResponse
        })?;

        let outcome = match self.store.write(&token) {
            Ok(()) => LoginOutcome::Persisted,
            Err(e) => {
                warn!(error = %e, "Failed to persist token, session will not survive a restart");
                LoginOutcome::SessionOnly(e)
            }
        };

        self.publish(SessionState::new(Some(token)));
        info!(persisted = outcome.is_persisted(), "Login successful");
        Ok(outcome)
    }

    /// Drop the session. Always reaches the unauthenticated state and is
    /// safe to repeat; a store that cannot be cleared is reported in the
    /// outcome.
    pub fn logout(&self) -> LogoutOutcome {
        let outcome = match self.store.clear() {
            Ok(()) => LogoutOutcome::Cleared,
            Err(e) => {
                warn!(error = %e, "Failed to clear persisted token");
                LogoutOutcome::TokenRetained(e)
            }
        };
        if self.publish(SessionState::unauthenticated()) {
            info!(cleared = outcome.is_cleared(), "Logged out");
        }
        outcome
    }

    /// Replace the state, notifying subscribers only when it changed.
    fn publish(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::auth::token_store::MemoryTokenStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    type Responder = Box<dyn Fn() -> Result<Value, ApiError> + Send + Sync>;

    struct FakeVerifier {
        respond: Responder,
        calls: AtomicUsize,
    }

    impl FakeVerifier {
        fn new(respond: impl Fn() -> Result<Value, ApiError> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialVerifier for FakeVerifier {
        async fn verify(&self, _credentials: &Credentials) -> Result<Value, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)()
        }
    }

    /// Holds the verifier call open until released.
    struct GatedVerifier {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialVerifier for GatedVerifier {
        async fn verify(&self, _credentials: &Credentials) -> Result<Value, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(json!({"token": "first"}))
        }
    }

    fn manager(store: Arc<MemoryTokenStore>, verifier: Arc<dyn CredentialVerifier>) -> SessionManager {
        SessionManager::new(store, verifier)
    }

    #[test]
    fn test_session_state_invariant() {
        assert!(!SessionState::new(None).is_authenticated());
        assert!(!SessionState::new(Some(String::new())).is_authenticated());
        assert_eq!(SessionState::new(Some(String::new())).token(), None);
        let state = SessionState::new(Some("t".to_string()));
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some("t"));
    }

    #[test]
    fn test_new_seeds_from_store() {
        let store = Arc::new(MemoryTokenStore::with_token("saved"));
        let verifier = FakeVerifier::new(|| Ok(json!({})));
        let session = manager(store, verifier.clone());
        assert_eq!(session.current_state().token(), Some("saved"));
        assert!(session.current_state().is_authenticated());
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_login_success_writes_store_and_state() {
        let store = Arc::new(MemoryTokenStore::new());
        let verifier = FakeVerifier::new(|| Ok(json!({"jwt": "tok"})));
        let session = manager(store.clone(), verifier.clone());

        let outcome = session.login("a@bank.com", "pw").await.unwrap();
        assert!(outcome.is_persisted());
        assert_eq!(session.current_state().token(), Some("tok"));
        assert_eq!(store.read().as_deref(), Some("tok"));
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_login_verifier_error_leaves_state() {
        let store = Arc::new(MemoryTokenStore::new());
        let verifier = FakeVerifier::new(|| Err(ApiError::Unauthorized("bad".to_string())));
        let session = manager(store.clone(), verifier);

        let err = session.login("a@bank.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed(ApiError::Unauthorized(_))));
        assert!(!session.current_state().is_authenticated());
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn test_login_without_token_keeps_previous_session() {
        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let verifier = FakeVerifier::new(|| Ok(json!({"data": {}})));
        let session = manager(store.clone(), verifier);

        let err = session.login("a@bank.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentialResponse));
        assert_eq!(session.current_state().token(), Some("old"));
        assert_eq!(store.read().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_login_with_unavailable_store_is_session_only() {
        let store = Arc::new(MemoryTokenStore::unavailable());
        let verifier = FakeVerifier::new(|| Ok(json!({"token": "tok"})));
        let session = manager(store.clone(), verifier);

        let outcome = session.login("a@bank.com", "pw").await.unwrap();
        assert!(!outcome.is_persisted());
        assert!(matches!(
            outcome.into_warning(),
            Some(AuthError::StorageUnavailable(StorageError::Disabled))
        ));
        assert!(session.current_state().is_authenticated());
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_and_is_idempotent() {
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let verifier = FakeVerifier::new(|| Ok(json!({})));
        let session = manager(store.clone(), verifier);

        assert!(session.logout().is_cleared());
        let once = session.current_state();
        assert!(session.logout().is_cleared());
        assert_eq!(session.current_state(), once);
        assert_eq!(once.token(), None);
        assert!(!once.is_authenticated());
        assert_eq!(store.read(), None);
    }

    #[tokio::test]
    async fn test_logout_with_unavailable_store_reports_retained_token() {
        let store = Arc::new(MemoryTokenStore::unavailable());
        let verifier = FakeVerifier::new(|| Ok(json!({"token": "tok"})));
        let session = manager(store, verifier);
        let _ = session.login("a@bank.com", "pw").await.unwrap();
        let mut rx = session.subscribe();

        let outcome = session.logout();
        assert!(!outcome.is_cleared());
        assert!(matches!(
            outcome.into_warning(),
            Some(AuthError::TokenNotCleared(StorageError::Disabled))
        ));
        assert!(!session.current_state().is_authenticated());
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let store = Arc::new(MemoryTokenStore::new());
        let verifier = FakeVerifier::new(|| Ok(json!({"token": "tok"})));
        let session = manager(store, verifier);
        let mut rx = session.subscribe();

        let _ = session.logout();
        assert!(!rx.has_changed().unwrap());

        let _ = session.login("a@bank.com", "pw").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        let _ = session.logout();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_login_rejected() {
        let store = Arc::new(MemoryTokenStore::new());
        let verifier = Arc::new(GatedVerifier {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let session = Arc::new(manager(store.clone(), verifier.clone()));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.login("a@bank.com", "pw").await })
        };
        verifier.entered.notified().await;

        let second = session.login("b@bank.com", "pw").await;
        assert!(matches!(second, Err(AuthError::LoginInProgress)));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);

        verifier.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(outcome.is_persisted());
        assert_eq!(session.current_state().token(), Some("first"));
        assert_eq!(store.read().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_login_allowed_again_after_failure() {
        let store = Arc::new(MemoryTokenStore::new());
        let verifier = FakeVerifier::new(|| Ok(json!({})));
        let session = manager(store, verifier.clone());

        assert!(session.login("a@bank.com", "pw").await.is_err());
        let err = session.login("a@bank.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentialResponse));
        assert_eq!(verifier.calls(), 2);
    }
}
