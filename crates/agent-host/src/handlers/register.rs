//! Registration completion handler.
//!
//! The registration flow itself (how the operator obtains a token) happens
//! outside this process. This handler accepts the resulting token, validates
//! it, and on success stores the `(token, identity)` pair in the session and
//! marks the agent registered. It never issues or renews tokens.

use crate::auth::UserInfo;
use crate::errors::HostError;
use crate::routes::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Request body for POST /api/v1/register.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Bearer token obtained out-of-band.
    pub token: String,
}

/// Response for POST /api/v1/register.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    /// Always true on success.
    pub registered: bool,

    /// Subject of the stored credentials.
    pub subject: String,
}

/// Handler for POST /api/v1/register
///
/// Reachable before registration via the gate's unregistered bypass.
#[instrument(skip_all, name = "agent.handlers.register")]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, HostError> {
    if request.token.is_empty() {
        return Err(HostError::BadRequest("token must not be empty".to_string()));
    }

    match state.validator.validate(&request.token).await? {
        Some(claims) => {
            let info = UserInfo::from_claims(&claims);
            let subject = info.subject.clone();

            state.session.store_credentials(request.token, info).await;

            tracing::info!(target: "agent.handlers.register", "Agent registered");
            Ok(Json(RegisterResponse {
                registered: true,
                subject,
            }))
        }
        None => Err(HostError::Forbidden(
            "registration token failed validation".to_string(),
        )),
    }
}
