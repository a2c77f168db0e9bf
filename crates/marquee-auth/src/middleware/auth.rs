//! Authentication middleware for permission-scoped routes
//!
//! [`Authenticator`] composes token extraction, verification, and the
//! permission gate into a single `authorize` call. [`RequirePermission`] wraps
//! that call as a `tower` layer so any route can be guarded with the
//! permission it requires; the verified [`ClaimSet`] lands in request
//! extensions for the handler to read.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

use crate::auth::extractor::bearer_token;
use crate::auth::jwks::KeySetCache;
use crate::auth::permissions::check_permission;
use crate::auth::verifier::{ClaimSet, TokenVerifier};
use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;

/// Verifies bearer tokens and enforces permissions for the Marquee API.
///
/// Cloning is cheap; clones share the key set cache, so a key fetched for one
/// request serves the others.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<TokenVerifier>,
}

impl Authenticator {
    /// Build an authenticator from configuration.
    ///
    /// Fails if the algorithm allowlist cannot be parsed or the HTTP client
    /// for key set fetches cannot be built; nothing is fetched yet.
    pub fn new(config: AuthConfig) -> Result<Self, ConfigError> {
        let keys = KeySetCache::new(&config)?;
        let verifier = TokenVerifier::new(Arc::new(config), keys)?;

        Ok(Self {
            verifier: Arc::new(verifier),
        })
    }

    /// Authorize one request for `permission`.
    ///
    /// Extracts the bearer token from the raw `Authorization` header value,
    /// verifies it, and checks the permission, in that order; the first
    /// failure wins. On success the caller receives the verified claims.
    pub async fn authorize(
        &self,
        permission: &str,
        authorization: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = self.verifier.verify(token).await?;
        check_permission(permission, &claims)?;

        debug!(subject = %claims.sub, permission, "request authorized");
        Ok(claims)
    }

    /// Layer that guards a route behind `permission`
    pub fn require(&self, permission: impl Into<String>) -> RequirePermission {
        RequirePermission::new(self.clone(), permission)
    }
}

/// `tower` layer that rejects requests lacking a verified token with the
/// required permission
#[derive(Clone)]
pub struct RequirePermission {
    authenticator: Authenticator,
    permission: String,
}

impl RequirePermission {
    pub fn new(authenticator: Authenticator, permission: impl Into<String>) -> Self {
        Self {
            authenticator,
            permission: permission.into(),
        }
    }
}

impl<S> Layer<S> for RequirePermission {
    type Service = RequirePermissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionService {
            inner,
            authenticator: self.authenticator.clone(),
            permission: self.permission.clone(),
        }
    }
}

/// Service produced by [`RequirePermission`]
#[derive(Clone)]
pub struct RequirePermissionService<S> {
    inner: S,
    authenticator: Authenticator,
    permission: String,
}

impl<S> Service<Request> for RequirePermissionService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Swap the clone in and move the original service into the future, so
        // the instance `poll_ready` was called on is the one that gets called.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let authenticator = self.authenticator.clone();
        let permission = self.permission.clone();
        Box::pin(async move {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok());

            match authenticator.authorize(&permission, authorization).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(error) => Ok(error.into_response()),
            }
        })
    }
}
