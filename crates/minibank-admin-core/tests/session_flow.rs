//! End-to-end session flows: boot, login, guarded navigation, logout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use minibank_admin_core::api::{ApiError, CredentialVerifier, Credentials};
use minibank_admin_core::auth::{
    AuthError, AuthHandle, FileTokenStore, MemoryTokenStore, SessionManager, TokenStore,
};
use minibank_admin_core::routing::{AdminPage, Navigator, Route, View};
use minibank_admin_core::shell::{AdminShell, Identity, MAIN_NAV};

/// Verifier returning a fixed body and recording what it was sent.
struct ScriptedVerifier {
    response: Value,
    calls: AtomicUsize,
    last_email: Mutex<Option<String>>,
}

impl ScriptedVerifier {
    fn returning(response: Value) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
            last_email: Mutex::new(None),
        })
    }
}

#[async_trait]
impl CredentialVerifier for ScriptedVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_email.lock().unwrap() = Some(credentials.email.clone());
        Ok(self.response.clone())
    }
}

fn handle_with(store: Arc<dyn TokenStore>, verifier: Arc<dyn CredentialVerifier>) -> AuthHandle {
    AuthHandle::new(SessionManager::new(store, verifier))
}

#[test]
fn fresh_process_redirects_protected_requests_to_login() {
    let store = Arc::new(MemoryTokenStore::new());
    let auth = handle_with(store, ScriptedVerifier::returning(json!({})));

    for page in AdminPage::ALL {
        let mut nav = Navigator::new(Route::Admin(page));
        let view = nav.reevaluate(&auth.state());
        assert!(matches!(view, View::Login), "{:?} was not redirected", page);
        assert_eq!(nav.current(), &Route::Login);
        assert!(!nav.history().can_go_back());
    }
}

#[tokio::test]
async fn access_token_login_renders_protected_subtree() {
    let store = Arc::new(MemoryTokenStore::new());
    let verifier = ScriptedVerifier::returning(json!({"accessToken": "tok123"}));
    let auth = handle_with(store.clone(), verifier.clone());

    let mut nav = Navigator::new(Route::Admin(AdminPage::Transactions));
    assert!(matches!(nav.reevaluate(&auth.state()), View::Login));

    let outcome = auth.login("a@bank.com", "pw").await.unwrap();
    assert!(outcome.is_persisted());

    let state = auth.state();
    assert_eq!(state.token(), Some("tok123"));
    assert!(state.is_authenticated());
    assert_eq!(store.read().as_deref(), Some("tok123"));
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    assert_eq!(verifier.last_email.lock().unwrap().as_deref(), Some("a@bank.com"));

    match nav.complete_login(&auth.state()) {
        View::Protected { authorized, route } => {
            assert_eq!(route, Route::Admin(AdminPage::Transactions));
            let identity = Identity::default();
            let shell = AdminShell::new(&authorized, &route, &identity, auth.logout_handle());
            assert_eq!(shell.page(), Some(AdminPage::Transactions));
            let active: Vec<_> = MAIN_NAV.iter().filter(|item| shell.is_active(item)).collect();
            assert_eq!(active.len(), 1);
            let token = auth.token();
            assert_eq!(shell.page_context(token.as_deref()).token, Some("tok123"));
        }
        other => panic!("expected protected view, got {:?}", other),
    }
}

#[tokio::test]
async fn response_without_token_is_rejected() {
    let store = Arc::new(MemoryTokenStore::new());
    let auth = handle_with(store.clone(), ScriptedVerifier::returning(json!({})));

    let err = auth.login("a@bank.com", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentialResponse));

    let state = auth.state();
    assert_eq!(state.token(), None);
    assert!(!state.is_authenticated());
    assert_eq!(store.read(), None);
}

#[tokio::test]
async fn every_supported_response_shape_logs_in() {
    let shapes = [
        json!({"token": "X"}),
        json!({"accessToken": "X"}),
        json!({"jwt": "X"}),
        json!({"data": {"token": "X"}}),
    ];
    for shape in shapes {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = handle_with(store.clone(), ScriptedVerifier::returning(shape.clone()));
        let _ = auth.login("a@bank.com", "pw").await.unwrap();
        assert_eq!(auth.token().as_deref(), Some("X"), "shape {}", shape);
        assert_eq!(store.read().as_deref(), Some("X"));
    }
}

#[tokio::test]
async fn logout_while_viewing_protected_page_redirects_immediately() {
    let store = Arc::new(MemoryTokenStore::with_token("tok"));
    let auth = handle_with(store.clone(), ScriptedVerifier::returning(json!({})));
    let mut changes = auth.subscribe();

    let mut nav = Navigator::new(Route::Admin(AdminPage::Counters));
    assert!(nav.reevaluate(&auth.state()).is_protected());

    assert!(auth.logout_handle().logout().is_cleared());

    assert!(changes.has_changed().unwrap());
    let state = changes.borrow_and_update().clone();
    let view = nav.reevaluate(&state);
    assert!(matches!(view, View::Login));
    assert_eq!(nav.current(), &Route::Login);
    assert_eq!(nav.return_to(), Some(&Route::Admin(AdminPage::Counters)));

    assert_eq!(auth.token(), None);
    assert_eq!(store.read(), None);

    assert!(auth.logout().is_cleared());
    assert!(!auth.is_authenticated());
    assert!(!changes.has_changed().unwrap());
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let store = Arc::new(FileTokenStore::new(dir.path()));
        let auth = handle_with(store, ScriptedVerifier::returning(json!({"token": "persisted"})));
        let _ = auth.login("a@bank.com", "pw").await.unwrap();
    }

    let verifier = ScriptedVerifier::returning(json!({}));
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let auth = handle_with(store, verifier.clone());
    assert_eq!(auth.token().as_deref(), Some("persisted"));
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);

    let mut nav = Navigator::new(Route::Root);
    assert!(nav.reevaluate(&auth.state()).is_protected());
    assert_eq!(nav.current(), &Route::Admin(AdminPage::Dashboard));

    assert!(auth.logout().is_cleared());
    let store = FileTokenStore::new(dir.path());
    assert_eq!(store.read(), None);
}

#[tokio::test]
async fn unavailable_storage_still_signs_in_for_this_process() {
    let store = Arc::new(MemoryTokenStore::unavailable());
    let auth = handle_with(store, ScriptedVerifier::returning(json!({"token": "t"})));

    let outcome = auth.login("a@bank.com", "pw").await.unwrap();
    let warning = outcome.into_warning().expect("storage warning");
    assert!(matches!(warning, AuthError::StorageUnavailable(_)));
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn logout_on_unavailable_storage_warns_and_still_signs_out() {
    let store = Arc::new(MemoryTokenStore::unavailable());
    let auth = handle_with(store, ScriptedVerifier::returning(json!({"token": "t"})));
    let _ = auth.login("a@bank.com", "pw").await.unwrap();

    let mut nav = Navigator::new(Route::Admin(AdminPage::Users));
    assert!(nav.reevaluate(&auth.state()).is_protected());

    let warning = auth.logout().into_warning().expect("retained-token warning");
    assert!(matches!(warning, AuthError::TokenNotCleared(_)));
    assert!(!auth.is_authenticated());
    assert!(matches!(nav.reevaluate(&auth.state()), View::Login));
}
