//! The admin shell: navigation frame around every protected page.
//!
//! The shell owns no authentication state. It is handed the identity and a
//! bound logout action and passes both through to the pages it frames.

use serde::{Deserialize, Serialize};

use crate::auth::{LogoutHandle, LogoutOutcome};
use crate::routing::{AdminPage, Authorized, Route};

/// Display-only identity supplied by the surrounding application.
/// Never verified or parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: Option<String>,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Administrator")
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub page: AdminPage,
    pub label: &'static str,
    pub hotkey: char,
}

/// Main menu, top to bottom.
pub const MAIN_NAV: &[NavItem] = &[
    NavItem { page: AdminPage::Dashboard, label: "Dashboard", hotkey: '1' },
    NavItem { page: AdminPage::Users, label: "Users", hotkey: '2' },
    NavItem { page: AdminPage::Counters, label: "Counters", hotkey: '3' },
    NavItem { page: AdminPage::Employees, label: "Employees", hotkey: '4' },
    NavItem { page: AdminPage::Kyc, label: "KYC", hotkey: '5' },
    NavItem { page: AdminPage::Transactions, label: "Transactions", hotkey: '6' },
    NavItem { page: AdminPage::Statistics, label: "Statistics", hotkey: '7' },
];

/// Bottom group, below the main menu.
pub const BOTTOM_NAV: &[NavItem] = &[
    NavItem { page: AdminPage::Settings, label: "Settings", hotkey: '8' },
];

/// Look up a sidebar entry by its hotkey.
pub fn nav_item_for_hotkey(c: char) -> Option<&'static NavItem> {
    MAIN_NAV.iter().chain(BOTTOM_NAV).find(|item| item.hotkey == c)
}

/// What a leaf page receives from the shell.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub identity: &'a Identity,
    pub token: Option<&'a str>,
}

pub struct AdminShell<'a> {
    route: &'a Route,
    identity: &'a Identity,
    logout: LogoutHandle,
}

impl<'a> AdminShell<'a> {
    /// Requires the guard's proof, so a shell only exists for admitted routes.
    pub fn new(
        _authorized: &'a Authorized,
        route: &'a Route,
        identity: &'a Identity,
        logout: LogoutHandle,
    ) -> Self {
        Self {
            route,
            identity,
            logout,
        }
    }

    pub fn route(&self) -> &Route {
        self.route
    }

    pub fn identity(&self) -> &Identity {
        self.identity
    }

    /// The page shown in the content area; `None` for an unknown admin path.
    pub fn page(&self) -> Option<AdminPage> {
        match self.route {
            Route::Admin(page) => Some(*page),
            _ => None,
        }
    }

    pub fn is_active(&self, item: &NavItem) -> bool {
        self.page() == Some(item.page)
    }

    pub fn page_context<'t>(&'t self, token: Option<&'t str>) -> PageContext<'t> {
        PageContext {
            identity: self.identity,
            token,
        }
    }

    pub fn logout(&self) -> LogoutOutcome {
        self.logout.logout()
    }
}
