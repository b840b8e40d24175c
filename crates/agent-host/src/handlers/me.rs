//! Current identity handler.
//!
//! Returns the identity the access gate attached to the request.

use crate::auth::UserInfo;
use crate::errors::HostError;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for the `/api/v1/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject of the validated token.
    pub subject: String,

    /// Display name (falls back to the subject).
    pub name: String,

    /// Email address, when the authority provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Granted permissions.
    pub permissions: Vec<String>,
}

/// Handler for GET /api/v1/me
///
/// Requires an identity attached by the access gate. While the agent is
/// unregistered the gate allows requests without attaching one; in that
/// case there is no identity to report and the request is a 401.
#[instrument(skip_all, name = "agent.handlers.me")]
pub async fn get_me(user: Option<Extension<UserInfo>>) -> Result<Json<MeResponse>, HostError> {
    let Some(Extension(user)) = user else {
        tracing::debug!(target: "agent.handlers.me", "No identity attached to request");
        return Err(HostError::Unauthenticated(
            "no authenticated identity".to_string(),
        ));
    };

    Ok(Json(MeResponse {
        subject: user.subject,
        name: user.name,
        email: user.email,
        permissions: user.permissions,
    }))
}
