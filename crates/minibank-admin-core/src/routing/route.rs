use std::fmt;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/admin/login";

/// Everything under this prefix except the login view requires a session.
pub const PROTECTED_PREFIX: &str = "/admin";

/// Pages nested in the admin shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminPage {
    Dashboard,
    Users,
    Counters,
    Employees,
    Kyc,
    Transactions,
    Statistics,
    Settings,
}

impl AdminPage {
    pub const ALL: [AdminPage; 8] = [
        AdminPage::Dashboard,
        AdminPage::Users,
        AdminPage::Counters,
        AdminPage::Employees,
        AdminPage::Kyc,
        AdminPage::Transactions,
        AdminPage::Statistics,
        AdminPage::Settings,
    ];

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "users" => Some(AdminPage::Users),
            "counters" => Some(AdminPage::Counters),
            "employees" => Some(AdminPage::Employees),
            "kyc" => Some(AdminPage::Kyc),
            "transactions" => Some(AdminPage::Transactions),
            "statistics" => Some(AdminPage::Statistics),
            "settings" => Some(AdminPage::Settings),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            AdminPage::Dashboard => "/admin",
            AdminPage::Users => "/admin/users",
            AdminPage::Counters => "/admin/counters",
            AdminPage::Employees => "/admin/employees",
            AdminPage::Kyc => "/admin/kyc",
            AdminPage::Transactions => "/admin/transactions",
            AdminPage::Statistics => "/admin/statistics",
            AdminPage::Settings => "/admin/settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AdminPage::Dashboard => "Dashboard",
            AdminPage::Users => "User management",
            AdminPage::Counters => "Counter management",
            AdminPage::Employees => "Employee management",
            AdminPage::Kyc => "KYC management",
            AdminPage::Transactions => "Transactions",
            AdminPage::Statistics => "Statistics",
            AdminPage::Settings => "Settings",
        }
    }
}

/// A location in the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`, which forwards to the dashboard
    Root,
    Login,
    Admin(AdminPage),
    NotFound(String),
}

impl Route {
    /// Parse a path. Query strings, fragments and trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() {
            return Route::Root;
        }
        if trimmed == LOGIN_PATH {
            return Route::Login;
        }
        if trimmed == PROTECTED_PREFIX {
            return Route::Admin(AdminPage::Dashboard);
        }

        trimmed
            .strip_prefix("/admin/")
            .and_then(AdminPage::from_segment)
            .map(Route::Admin)
            .unwrap_or_else(|| Route::NotFound(trimmed.to_string()))
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Root => "/",
            Route::Login => LOGIN_PATH,
            Route::Admin(page) => page.path(),
            Route::NotFound(path) => path.as_str(),
        }
    }

    /// True for every path under the protected prefix except the login view.
    pub fn is_protected(&self) -> bool {
        match self {
            Route::Root | Route::Login => false,
            Route::Admin(_) => true,
            Route::NotFound(path) => {
                path == PROTECTED_PREFIX || path.starts_with("/admin/")
            }
        }
    }

    /// Unconditional forward applied before any access check.
    pub fn forward(&self) -> Option<Route> {
        match self {
            Route::Root => Some(Route::Admin(AdminPage::Dashboard)),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
