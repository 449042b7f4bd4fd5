//! Data models for Mini Bank admin entities.
//!
//! - `AdminUser`: a user record as returned by the admin users endpoint
//! - `UserStatus`: account status used for filtering and dashboard counts

pub mod user;

pub use user::{status_counts, AdminUser, AdminUsersResponse, UserStatus};
