use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Account status as reported by the user service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UserStatus {
    Active,
    Locked,
    Frozen,
    Unknown,
}

impl UserStatus {
    pub fn from_api(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_uppercase).as_deref() {
            Some("ACTIVE") => UserStatus::Active,
            Some("LOCKED") => UserStatus::Locked,
            Some("FROZEN") => UserStatus::Frozen,
            _ => UserStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Locked => "Locked",
            UserStatus::Frozen => "Frozen",
            UserStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "citizenId", default)]
    pub citizen_id: Option<String>,
    #[serde(rename = "accountNumber", default)]
    pub account_number: Option<String>,
    #[serde(rename = "employeeCode", default)]
    pub employee_code: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl AdminUser {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(self.user_id.as_str())
    }

    pub fn status(&self) -> UserStatus {
        UserStatus::from_api(self.status.as_deref())
    }

    /// Only customers are listed on the users page; staff live under employees.
    pub fn is_customer(&self) -> bool {
        self.role.as_deref() == Some("CUSTOMER")
    }
}

/// Envelope returned by `GET /users/admin/users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUsersResponse {
    #[serde(default)]
    pub data: Vec<AdminUser>,
}

/// Count users per status, in status order.
pub fn status_counts(users: &[AdminUser]) -> BTreeMap<UserStatus, usize> {
    let mut counts = BTreeMap::new();
    for user in users {
        *counts.entry(user.status()).or_insert(0) += 1;
    }
    counts
}
