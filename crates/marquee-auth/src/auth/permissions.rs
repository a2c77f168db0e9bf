//! Permission checks against a verified claim set

use tracing::warn;

use crate::auth::verifier::ClaimSet;
use crate::error::AuthError;

impl ClaimSet {
    /// Whether the caller was granted `permission`. An absent permissions
    /// claim counts as not granted; use [`check_permission`] when the two
    /// cases need different handling.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }
}

/// Check that `permission` was granted to the verified caller.
///
/// A token without any permissions claim is a malformed or misconfigured
/// token and fails with [`AuthError::MissingPermissionsClaim`]; a token whose
/// list simply lacks the permission fails with [`AuthError::PermissionDenied`].
pub fn check_permission(permission: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    let Some(granted) = claims.permissions.as_deref() else {
        warn!(subject = %claims.sub, "token carries no permissions claim");
        return Err(AuthError::MissingPermissionsClaim);
    };

    if !granted.iter().any(|p| p == permission) {
        warn!(subject = %claims.sub, permission, "permission not granted");
        return Err(AuthError::PermissionDenied {
            permission: permission.to_string(),
        });
    }

    Ok(())
}
