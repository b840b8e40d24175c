//! Registration status handler.

use crate::routes::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Response for the `/api/v1/status` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Whether the agent has completed registration.
    pub registered: bool,

    /// Subject of the stored session credentials, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_subject: Option<String>,
}

/// Handler for GET /api/v1/status
///
/// Reports registration state. Usable before registration thanks to the
/// gate's unregistered bypass.
#[instrument(skip_all, name = "agent.handlers.status")]
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.session.snapshot().await;

    Json(StatusResponse {
        registered: snapshot.registered,
        session_subject: snapshot.credentials.map(|(_, info)| info.subject),
    })
}
