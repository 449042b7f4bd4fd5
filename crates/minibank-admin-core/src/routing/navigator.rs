//! Navigation with the guard applied on every move.

use tracing::debug;

use crate::auth::SessionState;

use super::guard::{Access, Authorized, RouteGuard};
use super::history::History;
use super::route::{AdminPage, Route};

/// What the front end should show for the current location.
#[derive(Debug)]
pub enum View {
    Login,
    /// A protected route the guard admitted.
    Protected { authorized: Authorized, route: Route },
    NotFound(String),
}

impl View {
    pub fn is_protected(&self) -> bool {
        matches!(self, View::Protected { .. })
    }
}

/// History plus guard. Every navigation, and every session change reported
/// through `reevaluate`, runs the current entry through the guard.
#[derive(Debug)]
pub struct Navigator {
    history: History,
    guard: RouteGuard,
    return_to: Option<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            history: History::new(initial),
            guard: RouteGuard::default(),
            return_to: None,
        }
    }

    pub fn current(&self) -> &Route {
        self.history.current()
    }

    /// Route a successful login should land on.
    pub fn return_to(&self) -> Option<&Route> {
        self.return_to.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn navigate(&mut self, route: Route, session: &SessionState) -> View {
        self.history.push(route);
        self.resolve(session)
    }

    pub fn replace(&mut self, route: Route, session: &SessionState) -> View {
        self.history.replace(route);
        self.resolve(session)
    }

    pub fn back(&mut self, session: &SessionState) -> View {
        self.history.back();
        self.resolve(session)
    }

    /// Re-run the guard against the current entry, e.g. after logout.
    pub fn reevaluate(&mut self, session: &SessionState) -> View {
        self.resolve(session)
    }

    /// Leave the login view for the originally requested route, or the
    /// dashboard, replacing the login entry.
    pub fn complete_login(&mut self, session: &SessionState) -> View {
        let target = self
            .return_to
            .take()
            .unwrap_or(Route::Admin(AdminPage::Dashboard));
        self.replace(target, session)
    }

    fn resolve(&mut self, session: &SessionState) -> View {
        if let Some(target) = self.history.current().forward() {
            self.history.replace(target);
        }

        let route = self.history.current().clone();
        match self.guard.check(&route, session) {
            Access::Granted(authorized) => View::Protected { authorized, route },
            Access::Redirect(redirect) => {
                debug!(from = %redirect.from, to = %redirect.to, "Guard redirect");
                self.return_to = Some(redirect.from);
                self.history.replace(redirect.to);
                View::Login
            }
            Access::Public => match route {
                Route::NotFound(path) => View::NotFound(path),
                // Root was forwarded above; Login is the only other public route.
                _ => View::Login,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed() -> SessionState {
        SessionState::new(Some("tok".to_string()))
    }

    #[test]
    fn test_root_forwards_then_guard_applies() {
        let mut nav = Navigator::new(Route::Root);
        let view = nav.reevaluate(&authed());
        assert!(view.is_protected());
        assert_eq!(nav.current(), &Route::Admin(AdminPage::Dashboard));

        let mut nav = Navigator::new(Route::Root);
        let view = nav.reevaluate(&SessionState::unauthenticated());
        assert!(matches!(view, View::Login));
        assert_eq!(nav.current(), &Route::Login);
        assert_eq!(nav.return_to(), Some(&Route::Admin(AdminPage::Dashboard)));
    }

    #[test]
    fn test_redirect_replaces_history_entry() {
        let session = SessionState::unauthenticated();
        let mut nav = Navigator::new(Route::Login);
        let view = nav.navigate(Route::Admin(AdminPage::Users), &session);
        assert!(matches!(view, View::Login));
        assert_eq!(nav.current(), &Route::Login);

        // The rejected users entry is gone: one step back is the start.
        nav.back(&session);
        assert_eq!(nav.current(), &Route::Login);
        assert!(!nav.history().can_go_back());
    }

    #[test]
    fn test_complete_login_returns_to_requested_route() {
        let mut nav = Navigator::new(Route::Admin(AdminPage::Kyc));
        nav.reevaluate(&SessionState::unauthenticated());
        assert_eq!(nav.current(), &Route::Login);

        let view = nav.complete_login(&authed());
        match view {
            View::Protected { route, .. } => assert_eq!(route, Route::Admin(AdminPage::Kyc)),
            other => panic!("expected protected view, got {:?}", other),
        }
        assert!(!nav.history().can_go_back());
        assert_eq!(nav.return_to(), None);
    }

    #[test]
    fn test_complete_login_defaults_to_dashboard() {
        let mut nav = Navigator::new(Route::Login);
        nav.reevaluate(&SessionState::unauthenticated());
        nav.complete_login(&authed());
        assert_eq!(nav.current(), &Route::Admin(AdminPage::Dashboard));
    }

    #[test]
    fn test_back_after_login_skips_login_view() {
        let mut nav = Navigator::new(Route::Admin(AdminPage::Dashboard));
        nav.reevaluate(&authed());
        nav.navigate(Route::Admin(AdminPage::Users), &authed());

        // Session ends while on the users page.
        nav.reevaluate(&SessionState::unauthenticated());
        assert_eq!(nav.current(), &Route::Login);

        nav.complete_login(&authed());
        assert_eq!(nav.current(), &Route::Admin(AdminPage::Users));

        let view = nav.back(&authed());
        assert!(view.is_protected());
        assert_eq!(nav.current(), &Route::Admin(AdminPage::Dashboard));
    }

    #[test]
    fn test_unknown_public_path_is_not_found() {
        let mut nav = Navigator::new(Route::parse("/nowhere"));
        let view = nav.reevaluate(&SessionState::unauthenticated());
        assert!(matches!(view, View::NotFound(ref p) if p == "/nowhere"));
    }
}
