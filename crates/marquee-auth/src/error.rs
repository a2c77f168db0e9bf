//! Error types for the Marquee authentication core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Authentication/authorization failure.
///
/// Every failure path in the core produces exactly one of these variants, each
/// carrying a stable machine-readable code and an HTTP status. Rendered as the
/// API's error envelope by the [`IntoResponse`] impl.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("authorization header is expected")]
    MissingAuthorizationHeader,

    /// Header present but not of the form `Bearer <token>`
    #[error("authorization header must be of the form \"Bearer <token>\"")]
    MalformedHeader,

    /// Token header missing a key id, undecodable, or the signature could not
    /// be verified
    #[error("{message}")]
    InvalidHeader {
        message: &'static str,
        status: StatusCode,
    },

    /// No key in the refreshed key set matches the token's key id
    #[error("unable to find a signing key for the token")]
    KeyNotFound { kid: String },

    /// The provider's key set endpoint could not be reached or returned an
    /// unusable document
    #[error("unable to retrieve the signing key set")]
    KeySetUnavailable { message: String },

    /// Token expired
    #[error("token expired")]
    TokenExpired,

    /// Issuer or audience did not match the configured values
    #[error("incorrect claims, check the audience and issuer")]
    InvalidClaims,

    /// Token verified but carries no permissions claim at all
    #[error("permissions claim is missing from the token")]
    MissingPermissionsClaim,

    /// Token verified but the required permission was not granted
    #[error("permission not found")]
    PermissionDenied { permission: String },
}

impl AuthError {
    /// Token that could not be parsed or whose signature failed verification.
    pub(crate) fn invalid_token() -> Self {
        AuthError::InvalidHeader {
            message: "unable to parse authentication token",
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Token header without a key id to select a verification key with.
    pub(crate) fn missing_key_id() -> Self {
        AuthError::InvalidHeader {
            message: "token header is missing a key id",
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorizationHeader => "missing_authorization_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidHeader { .. } => "invalid_header",
            AuthError::KeyNotFound { .. } => "key_not_found",
            AuthError::KeySetUnavailable { .. } => "key_set_unavailable",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::MissingPermissionsClaim => "missing_permissions_claim",
            AuthError::PermissionDenied { .. } => "permission_denied",
        }
    }

    /// HTTP status this error answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorizationHeader
            | AuthError::MalformedHeader
            | AuthError::TokenExpired
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::InvalidHeader { status, .. } => *status,
            AuthError::KeyNotFound { .. } | AuthError::MissingPermissionsClaim => {
                StatusCode::BAD_REQUEST
            }
            AuthError::KeySetUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            // The upstream API answers 401 for an authenticated caller that
            // lacks the grant; 403 would be the conventional choice. Change
            // this arm to switch.
            AuthError::PermissionDenied { .. } => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
