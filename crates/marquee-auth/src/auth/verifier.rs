//! Token verification against the provider's key set
//!
//! Decodes a bearer token's header to find the signing key id, resolves the
//! key through [`KeySetCache`], and validates signature, issuer, audience,
//! and expiry in one pass. Only asymmetric RSA keys are accepted; the
//! algorithm allowlist is checked before any other processing.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::jwks::{Jwk, KeySetCache};
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;

/// Verified claims decoded from a bearer token.
///
/// Produced only by successful verification and never mutated afterwards.
/// Handlers receive it by value (the middleware clones it into request
/// extensions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer
    pub iss: String,

    /// Audience, a single string or an array depending on the provider
    pub aud: Audience,

    /// Expiration time (Unix timestamp)
    pub exp: u64,

    /// Subject (user identifier)
    pub sub: String,

    /// Permissions granted to the caller. `None` when the token carries no
    /// permissions claim at all, which the gate reports as a malformed token
    /// rather than a denied user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Custom claims
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

/// The `aud` claim, which providers serialize as a single string or an array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `audience` is among the token's audiences
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Validates bearer tokens against the configured issuer and audience,
/// resolving signing keys through a [`KeySetCache`].
#[derive(Debug)]
pub struct TokenVerifier {
    config: Arc<AuthConfig>,
    algorithms: Vec<Algorithm>,
    keys: KeySetCache,
}

impl TokenVerifier {
    /// Build a verifier, parsing the configured algorithm allowlist once.
    pub fn new(config: Arc<AuthConfig>, keys: KeySetCache) -> Result<Self, ConfigError> {
        if config.algorithms.is_empty() {
            return Err(ConfigError::Parse {
                details: "algorithms list must not be empty".to_string(),
            });
        }

        let algorithms = config
            .algorithms
            .iter()
            .map(|name| {
                name.parse::<Algorithm>()
                    .map_err(|_| ConfigError::UnsupportedAlgorithm { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            algorithms,
            keys,
        })
    }

    /// Verify `token` and return its decoded claims.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "failed to decode token header");
            AuthError::invalid_token()
        })?;

        if !self.algorithms.contains(&header.alg) {
            warn!(algorithm = ?header.alg, "token signed with an algorithm outside the allowlist");
            return Err(AuthError::invalid_token());
        }

        let kid = header.kid.ok_or_else(AuthError::missing_key_id)?;
        let jwk = self.keys.get_key(&kid).await?;
        let key = decoding_key(&jwk)?;

        let mut validation = Validation::new(header.alg);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.leeway = self.config.allowed_clock_skew.as_secs();

        let data = decode::<ClaimSet>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::MissingRequiredClaim(_) => {
                warn!(error = %e, "token claims rejected");
                AuthError::InvalidClaims
            }
            _ => {
                debug!(error = %e, "token validation failed");
                AuthError::invalid_token()
            }
        })?;

        Ok(data.claims)
    }
}

/// Build a decoding key from the RSA components of a published JWK.
fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if jwk.kty != "RSA" {
        warn!(kty = %jwk.kty, "unsupported key type in key set");
        return Err(AuthError::invalid_token());
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        warn!("RSA key in key set is missing modulus or exponent");
        return Err(AuthError::invalid_token());
    };

    DecodingKey::from_rsa_components(n, e).map_err(|err| {
        debug!(error = %err, "failed to build decoding key from JWK");
        AuthError::invalid_token()
    })
}
