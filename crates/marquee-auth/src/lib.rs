//! # Marquee Auth
//!
//! Authentication and authorization core for the Marquee casting API.
//!
//! ## Features
//!
//! - **Token Extraction**: Parse bearer tokens out of `Authorization` headers
//! - **Key Set Caching**: Fetch the identity provider's JWKS on demand and
//!   cache it with atomic snapshot replacement
//! - **Token Verification**: Validate signature, issuer, audience, and expiry
//!   against the configured identity provider
//! - **Permission Enforcement**: Require a granted permission before a
//!   protected operation runs
//! - **Middleware**: A `tower` layer that guards any `axum` route behind a
//!   required permission
//!
//! Request handlers never talk to the identity provider themselves. They wrap
//! a route with [`Authenticator::require`] (or call
//! [`Authenticator::authorize`] directly) and read the verified [`ClaimSet`]
//! from request extensions.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;

// Re-export commonly used types
pub use auth::extractor::bearer_token;
pub use auth::jwks::KeySetCache;
pub use auth::permissions::check_permission;
pub use auth::verifier::{Audience, ClaimSet, TokenVerifier};
pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use middleware::{Authenticator, RequirePermission};

/// Version of the marquee-auth crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
