//! JWKS (JSON Web Key Set) fetching and caching
//!
//! Retrieves the identity provider's public keys from its well-known endpoint
//! and caches them as immutable snapshots. A snapshot is replaced wholesale
//! when a token references a key id it does not contain or when it ages past
//! the configured TTL; readers always see a complete set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;

/// A single JSON Web Key as published by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: Option<String>,
    pub alg: Option<String>,
    pub r#use: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

/// Key set document as served by the provider's well-known endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// One fully built key set, tagged with its fetch time.
///
/// Snapshots are immutable; a refresh builds a new one and swaps it in.
#[derive(Debug)]
struct KeySetSnapshot {
    keys: Vec<Jwk>,
    fetched_at: Instant,
}

impl KeySetSnapshot {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Supplies the signing key matching a requested key id, minimizing round
/// trips to the identity provider.
///
/// Cloning is cheap and clones share the cache. Readers take the current
/// snapshot under a short read lock; a refresh fetches with no lock held and
/// swaps the finished snapshot in under a short write lock, so concurrent
/// requests observe either the pre-refresh or the post-refresh set in full.
#[derive(Debug, Clone)]
pub struct KeySetCache {
    jwks_url: String,
    http_client: reqwest::Client,
    ttl: Duration,
    snapshot: Arc<RwLock<Option<Arc<KeySetSnapshot>>>>,
}

impl KeySetCache {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.jwks_timeout)
            .connect_timeout(config.jwks_connect_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                details: e.to_string(),
            })?;

        Ok(Self {
            jwks_url: config.jwks_url(),
            http_client,
            ttl: config.jwks_cache_ttl,
            snapshot: Arc::new(RwLock::new(None)),
        })
    }

    /// Resolve the key for `kid`, refreshing the cached set at most once.
    ///
    /// A key id still absent after the refresh fails with
    /// [`AuthError::KeyNotFound`]; fetch problems fail with
    /// [`AuthError::KeySetUnavailable`] and are never retried within the same
    /// request.
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(snapshot) = self.current().await {
            if snapshot.is_fresh(self.ttl) {
                if let Some(jwk) = snapshot.find(kid) {
                    debug!(kid, "resolved signing key from cached key set");
                    return Ok(jwk.clone());
                }
            }
        }

        let snapshot = self.refresh().await?;
        match snapshot.find(kid) {
            Some(jwk) => Ok(jwk.clone()),
            None => {
                warn!(kid, "key id not present in refreshed key set");
                Err(AuthError::KeyNotFound {
                    kid: kid.to_string(),
                })
            }
        }
    }

    async fn current(&self) -> Option<Arc<KeySetSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Fetch the key set and swap it in as the new snapshot.
    async fn refresh(&self) -> Result<Arc<KeySetSnapshot>, AuthError> {
        let jwk_set = self.fetch().await?;
        let snapshot = Arc::new(KeySetSnapshot {
            keys: jwk_set.keys,
            fetched_at: Instant::now(),
        });
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    #[instrument(level = "debug", skip(self), fields(url = %self.jwks_url))]
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        debug!("fetching key set");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to fetch key set");
                AuthError::KeySetUnavailable {
                    message: e.to_string(),
                }
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "key set endpoint returned an error");
            return Err(AuthError::KeySetUnavailable {
                message: format!("key set endpoint returned {}", response.status()),
            });
        }

        let jwk_set: JwkSet = response.json().await.map_err(|e| {
            warn!(error = %e, "failed to parse key set document");
            AuthError::KeySetUnavailable {
                message: e.to_string(),
            }
        })?;

        if jwk_set.keys.is_empty() {
            warn!("key set document contains no keys");
            return Err(AuthError::KeySetUnavailable {
                message: "key set contains no keys".to_string(),
            });
        }

        debug!(key_count = jwk_set.keys.len(), "fetched key set");
        Ok(jwk_set)
    }
}
