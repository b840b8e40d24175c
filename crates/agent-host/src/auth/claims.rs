//! Verified token claims and the identity projected from them.
//!
//! `Claims` is the payload of a token once signature, audience, issuer and
//! expiry checks have passed. `UserInfo` is the projection attached to
//! requests. Identity-bearing fields are redacted in Debug output to keep
//! them out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by a validated token.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Intended audience; must equal the configured audience exactly.
    pub aud: String,

    /// Token issuer; must equal `https://{auth_domain}/` exactly.
    pub iss: String,

    /// Email address, if the authority provides one - redacted in Debug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name, if the authority provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Permissions granted to this token. Absent claim means none.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Custom Debug implementation that redacts `sub` and `email`.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("permissions", &self.permissions)
            .finish()
    }
}

impl Claims {
    /// Check whether this token grants a specific permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Identity derived from validated claims, attached to request extensions
/// by the access gate.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct UserInfo {
    /// Subject of the validated token.
    pub subject: String,

    /// Email address, when present in the claims.
    pub email: Option<String>,

    /// Display name; falls back to the subject when absent.
    pub name: String,

    /// Granted permissions; empty when the claim is absent.
    pub permissions: Vec<String>,
}

impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInfo")
            .field("subject", &"[REDACTED]")
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("permissions", &self.permissions)
            .finish()
    }
}

impl UserInfo {
    /// Pure projection from validated claims. Never fails.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone().unwrap_or_else(|| claims.sub.clone()),
            permissions: claims.permissions.clone(),
        }
    }
}
