//! Access control in front of the protected admin area.

use tracing::debug;

use crate::auth::SessionState;

use super::route::Route;

/// The guard's two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    Authenticated,
}

/// `Authenticated` iff the session is authenticated. Nothing else counts.
pub fn evaluate(session: &SessionState) -> GuardState {
    if session.is_authenticated() {
        GuardState::Authenticated
    } else {
        GuardState::Unauthenticated
    }
}

/// Proof that the guard admitted a protected route.
///
/// Only this module can build one, so anything that requires it (the admin
/// shell) cannot be constructed for an unauthenticated session.
#[derive(Debug)]
pub struct Authorized {
    _private: (),
}

/// Where to send a request the guard turned away. The target always
/// replaces the rejected history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    /// The route originally requested.
    pub from: Route,
}

#[derive(Debug)]
pub enum Access {
    /// Route needs no session.
    Public,
    Granted(Authorized),
    Redirect(Redirect),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_route: Route,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login_route: Route::Login,
        }
    }
}

impl RouteGuard {
    pub fn check(&self, route: &Route, session: &SessionState) -> Access {
        if !route.is_protected() {
            return Access::Public;
        }

        match evaluate(session) {
            GuardState::Authenticated => Access::Granted(Authorized { _private: () }),
            GuardState::Unauthenticated => {
                debug!(requested = %route, "Unauthenticated, redirecting to login");
                Access::Redirect(Redirect {
                    to: self.login_route.clone(),
                    from: route.clone(),
                })
            }
        }
    }
}
