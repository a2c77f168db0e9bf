//! Bearer token extraction from the `Authorization` header

use crate::error::AuthError;

/// Pull the bearer token out of an `Authorization` header value.
///
/// The header must consist of exactly two whitespace-separated parts, the
/// first being `Bearer` in any casing. Anything else is rejected before key
/// resolution ever runs.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingAuthorizationHeader)?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(AuthError::MalformedHeader),
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
