//! Configuration for the Marquee authentication core

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating [`AuthConfig`].
///
/// Raised once at construction time; per-request failures are
/// [`crate::error::AuthError`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration could not be loaded or parsed
    #[error("failed to load configuration: {details}")]
    Parse { details: String },

    /// Algorithm name not recognized by the token library
    #[error("unsupported signing algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    /// HTTP client for key set fetches could not be built
    #[error("failed to build HTTP client: {details}")]
    HttpClient { details: String },
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity provider domain, e.g. "your-tenant.auth0.com". A full
    /// `http(s)://` origin is also accepted, which is mainly useful for
    /// pointing at a local mock provider.
    pub domain: String,

    /// Expected audience of accepted tokens
    pub audience: String,

    /// Accepted signing algorithm names
    pub algorithms: Vec<String>,

    /// How long a fetched key set snapshot stays fresh
    pub jwks_cache_ttl: Duration,

    /// Overall timeout for a key set fetch
    pub jwks_timeout: Duration,

    /// Connect timeout for a key set fetch
    pub jwks_connect_timeout: Duration,

    /// Allowed clock skew when checking token expiry
    pub allowed_clock_skew: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: "your-tenant.auth0.com".to_string(),
            audience: "https://api.your-domain.com".to_string(),
            algorithms: vec!["RS256".to_string()],
            jwks_cache_ttl: Duration::from_secs(3600),
            jwks_timeout: Duration::from_secs(10),
            jwks_connect_timeout: Duration::from_secs(5),
            allowed_clock_skew: Duration::ZERO,
        }
    }
}

impl AuthConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Values merge in order: built-in defaults, then the TOML file
    /// (`marquee-auth.toml` when no path is given), then environment
    /// variables prefixed with `MARQUEE_AUTH_`.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(AuthConfig::default()));
        let figment = match config_path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file("marquee-auth.toml")),
        };

        figment
            .merge(Env::prefixed("MARQUEE_AUTH_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Parse {
                details: e.to_string(),
            })
    }

    /// Generate example configuration file
    pub fn generate_example() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parse {
            details: format!("failed to serialize config: {e}"),
        })
    }

    /// Expected issuer of accepted tokens, with a trailing slash as issued by
    /// the provider.
    pub fn issuer(&self) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            format!("{}/", self.domain.trim_end_matches('/'))
        } else {
            format!("https://{}/", self.domain)
        }
    }

    /// URL of the provider's published key set
    pub fn jwks_url(&self) -> String {
        format!("{}.well-known/jwks.json", self.issuer())
    }
}
