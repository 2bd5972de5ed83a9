//! Admin access: credential directory, bearer sessions and role-to-view routing.

pub mod auth;
pub mod directory;
pub mod rbac;

pub use auth::{Session, SessionManager};
pub use directory::{AdminAccount, AdminDirectory};
pub use rbac::{RoleRouter, ViewKind, ViewSource};
