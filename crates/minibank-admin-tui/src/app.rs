//! Application state management for the admin console.
//!
//! `App` wires the session handle, the navigator and the API client together
//! and keeps the UI state the renderer draws from. Logins and data fetches run
//! as spawned tasks that report back through a channel drained by the event
//! loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use minibank_admin_core::api::{ApiClient, ApiError};
use minibank_admin_core::auth::{
    AuthError, AuthHandle, LoginOutcome, MemoryTokenStore, SessionManager, SessionState,
};
use minibank_admin_core::models::AdminUser;
use minibank_admin_core::routing::{AdminPage, Navigator, Route, View};
use minibank_admin_core::shell::{AdminShell, Identity};
use minibank_admin_core::Config;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the go-to-path prompt.
const MAX_PATH_LENGTH: usize = 64;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay and modal state, independent of which view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    EnteringPath,
    ShowingHelp,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks.
pub enum TaskResult {
    /// A login attempt finished.
    Login {
        email: String,
        result: Result<LoginOutcome, AuthError>,
    },
    /// The admin user directory was fetched during session `generation`.
    Users {
        generation: u64,
        result: Result<Vec<AdminUser>, ApiError>,
    },
}

// ============================================================================
// Startup
// ============================================================================

/// Build the session handle and API client from config.
///
/// A token backend that cannot be opened falls back to memory, so the
/// console still works but sessions end with the process. The returned
/// client carries no token; requests take it from the session when made.
pub fn open_session(config: &Config, data_dir: &Path) -> Result<(AuthHandle, ApiClient)> {
    let base_url = config.api_base_url();
    let api = ApiClient::new(&base_url)
        .with_context(|| format!("Failed to create API client for {}", base_url))?;

    let store = match config.token_backend.open(data_dir) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, backend = ?config.token_backend, "Token store unavailable, using memory");
            Arc::new(MemoryTokenStore::new())
        }
    };

    let auth = AuthHandle::new(SessionManager::new(store, Arc::new(api.clone())));
    debug!(base_url = %base_url, authenticated = auth.is_authenticated(), "Session opened");

    Ok((auth, api))
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    config_path: Option<PathBuf>,
    pub auth: AuthHandle,
    /// Tokenless; see `fetch_users`.
    pub api: ApiClient,
    session_rx: watch::Receiver<SessionState>,
    /// Bumped on every session change; tags background fetches.
    session_generation: u64,

    // Navigation
    pub navigator: Navigator,
    pub view: View,

    // UI State
    pub state: AppState,
    pub path_input: String,
    pub status_message: Option<String>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Shell data
    pub identity: Identity,
    pub signed_in_at: Option<DateTime<Local>>,
    pub users: Vec<AdminUser>,
    pub users_loading: bool,
    pub users_error: Option<String>,
    pub user_selection: usize,

    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,
}

impl App {
    /// Create the application and resolve the initial route through the guard.
    ///
    /// `config_path` is where the last-used email is saved; `None` keeps
    /// config changes in memory.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        auth: AuthHandle,
        api: ApiClient,
        initial: Route,
    ) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = auth.subscribe();

        let mut navigator = Navigator::new(initial);
        let view = navigator.reevaluate(&auth.state());
        debug!(route = %navigator.current(), "Initial view resolved");

        let login_email = std::env::var("MINIBANK_EMAIL")
            .ok()
            .filter(|e| !e.is_empty())
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        let identity = Identity {
            username: config.last_email.clone().filter(|_| auth.is_authenticated()),
            avatar: None,
        };

        let mut app = Self {
            config,
            config_path,
            auth,
            api,
            session_rx,
            session_generation: 0,

            navigator,
            view,

            state: AppState::Normal,
            path_input: String::new(),
            status_message: None,

            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,
            login_pending: false,

            identity,
            signed_in_at: None,
            users: Vec::new(),
            users_loading: false,
            users_error: None,
            user_selection: 0,

            task_tx,
            task_rx,
        };
        app.on_page_entered();
        app
    }

    /// The admin shell for the current view, if the guard admitted it.
    pub fn shell(&self) -> Option<AdminShell<'_>> {
        match &self.view {
            View::Protected { authorized, route } => Some(AdminShell::new(
                authorized,
                route,
                &self.identity,
                self.auth.logout_handle(),
            )),
            _ => None,
        }
    }

    pub fn is_login_view(&self) -> bool {
        matches!(self.view, View::Login)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Start a login with the credentials from the login form.
    ///
    /// The verifier call runs in a spawned task; the result arrives through
    /// `check_background_tasks`.
    pub fn attempt_login(&mut self) {
        if self.login_pending {
            return;
        }

        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();
        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }

        self.login_error = None;
        self.login_pending = true;

        let auth = self.auth.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = auth.login(&email, &password).await;
            Self::send_result(&tx, TaskResult::Login { email, result }).await;
        });
    }

    /// Log out through the shell's bound handle. The redirect to the login
    /// view happens when the session change is picked up.
    pub fn logout(&mut self) {
        let outcome = match self.shell() {
            Some(shell) => shell.logout(),
            None => self.auth.logout(),
        };
        self.status_message = Some(match outcome.into_warning() {
            Some(warning) => warning.user_message(),
            None => "Signed out".to_string(),
        });
    }

    fn reset_login_form(&mut self) {
        self.login_password.clear();
        self.login_error = None;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
    }

    /// Record who signed in, then leave the login view if it is still showing.
    fn on_login_success(&mut self, email: String, outcome: LoginOutcome) {
        self.login_password.clear();
        self.login_error = None;

        let state = self.auth.state();
        if !state.is_authenticated() {
            debug!("Session ended before the login result arrived");
            return;
        }

        self.config.last_email = Some(email.clone());
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }

        self.identity.username = Some(email);
        self.signed_in_at = Some(Local::now());
        self.status_message = outcome.into_warning().map(|w| w.user_message());

        if self.is_login_view() {
            self.view = self.navigator.complete_login(&state);
            self.on_page_entered();
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, route: Route) {
        self.view = self.navigator.navigate(route, &self.auth.state());
        self.on_page_entered();
    }

    pub fn navigate_to_page(&mut self, page: AdminPage) {
        if self.navigator.current() == &Route::Admin(page) {
            return;
        }
        self.navigate(Route::Admin(page));
    }

    pub fn back(&mut self) {
        self.view = self.navigator.back(&self.auth.state());
        self.on_page_entered();
    }

    /// Navigate to the path typed into the go-to prompt.
    pub fn submit_path(&mut self) {
        let path = self.path_input.trim().to_string();
        self.path_input.clear();
        self.state = AppState::Normal;
        if path.is_empty() {
            return;
        }
        self.navigate(Route::parse(&path));
    }

    fn on_page_entered(&mut self) {
        if self.is_login_view() {
            self.reset_login_form();
            return;
        }
        let shows_users = self.view.is_protected()
            && matches!(
                self.navigator.current(),
                Route::Admin(AdminPage::Dashboard | AdminPage::Users)
            );
        if shows_users && self.users.is_empty() && !self.users_loading {
            self.fetch_users();
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Fetch the user directory with the session's current token.
    pub fn fetch_users(&mut self) {
        if self.users_loading {
            return;
        }
        let Some(token) = self.auth.token() else {
            return;
        };
        self.users_loading = true;
        self.users_error = None;

        let api = self.api.with_token(token);
        let generation = self.session_generation;
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_admin_users().await;
            Self::send_result(&tx, TaskResult::Users { generation, result }).await;
        });
    }

    /// Users with the customer role, as listed on the users page.
    pub fn customers(&self) -> Vec<&AdminUser> {
        let mut customers: Vec<&AdminUser> =
            self.users.iter().filter(|u| u.is_customer()).collect();
        customers.sort_by_key(|u| u.display_name().to_lowercase());
        customers
    }

    pub fn select_next_user(&mut self, step: usize) {
        let count = self.customers().len();
        if count > 0 {
            self.user_selection = (self.user_selection + step).min(count - 1);
        }
    }

    pub fn select_prev_user(&mut self, step: usize) {
        self.user_selection = self.user_selection.saturating_sub(step);
    }

    // =========================================================================
    // Event Loop Hooks
    // =========================================================================

    /// Re-run the guard if the session changed since the last check.
    ///
    /// Data loaded under the previous session is dropped, and fetches still
    /// in flight for it will be discarded when they report.
    pub fn check_session_changes(&mut self) {
        if !self.session_rx.has_changed().unwrap_or(false) {
            return;
        }
        let state = self.session_rx.borrow_and_update().clone();
        self.session_generation = self.session_generation.wrapping_add(1);
        debug!(
            authenticated = state.is_authenticated(),
            generation = self.session_generation,
            "Session change observed"
        );

        self.users.clear();
        self.users_loading = false;
        self.users_error = None;
        self.user_selection = 0;
        if !state.is_authenticated() {
            self.identity = Identity::default();
            self.signed_in_at = None;
        }

        let was_login = self.is_login_view();
        self.view = self.navigator.reevaluate(&state);
        if !was_login {
            self.on_page_entered();
        }
    }

    /// Drain finished background tasks.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.handle_task_result(result);
        }
    }

    pub fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Login { email, result } => {
                self.login_pending = false;
                match result {
                    Ok(outcome) => self.on_login_success(email, outcome),
                    Err(e) if self.is_login_view() => {
                        error!(error = %e, "Login failed");
                        self.login_password.clear();
                        self.login_focus = LoginFocus::Password;
                        self.login_error = Some(e.user_message());
                    }
                    Err(e) => {
                        debug!(error = %e, "Login failure arrived after leaving the login view, ignoring");
                    }
                }
            }
            TaskResult::Users { generation, result } => {
                if generation != self.session_generation {
                    debug!(generation, "User list from an earlier session, discarding");
                    return;
                }
                self.users_loading = false;
                match result {
                    Ok(users) => {
                        info!(count = users.len(), "Admin users loaded");
                        self.users = users;
                        self.user_selection = 0;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch admin users");
                        self.users_error = Some(e.to_string());
                    }
                }
            }
        }
    }

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("Task result dropped, receiver closed");
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_path_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PATH_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

// ============================================================================
// Tests
// ============================================================================
