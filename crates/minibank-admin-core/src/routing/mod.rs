//! Routes, navigation history and the route guard.

pub mod guard;
pub mod history;
pub mod navigator;
pub mod route;

pub use guard::{evaluate, Access, Authorized, GuardState, Redirect, RouteGuard};
pub use history::History;
pub use navigator::{Navigator, View};
pub use route::{AdminPage, Route, LOGIN_PATH, PROTECTED_PREFIX};
