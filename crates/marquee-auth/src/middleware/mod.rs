//! Request guard middleware

mod auth;

pub use auth::{Authenticator, RequirePermission, RequirePermissionService};
