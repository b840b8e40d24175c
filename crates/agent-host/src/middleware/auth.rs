//! Access decision gate for protected routes.
//!
//! Per-request middleware that combines the process-local session with the
//! incoming `Authorization` header. States are evaluated in strict order;
//! the first match decides:
//!
//! 1. Unregistered agent: allow unconditionally, so the registration flow
//!    stays reachable.
//! 2. Stored session whose token still validates: allow.
//! 3. Stored session whose token fails validation: clear both stored fields
//!    together, then fall through to the header check.
//! 4. Valid `Authorization: Bearer` token: attach the derived identity,
//!    allow.
//! 5. Header present but invalid: 403 Forbidden.
//! 6. No credentials at all: 401 Unauthorized.
//!
//! A key set fetch failure is an operational error, surfaced as 503 rather
//! than either rejection.

use crate::auth::{Session, TokenValidator, UserInfo};
use crate::errors::HostError;
use crate::observability::metrics::record_auth_decision;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the access gate middleware.
#[derive(Clone)]
pub struct GateState {
    /// Token validator backed by the key set cache.
    pub validator: Arc<TokenValidator>,

    /// Process-local session state.
    pub session: Arc<Session>,
}

/// Access gate middleware wrapping the protected routes.
///
/// May mutate the session (clearing a stale token/identity pair) and may
/// attach a [`UserInfo`] to request extensions before delegating. Never
/// issues or renews tokens.
#[instrument(skip(state, req, next), name = "agent.middleware.auth")]
pub async fn access_gate(
    State(state): State<Arc<GateState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HostError> {
    let snapshot = state.session.snapshot().await;

    // Unregistered agent: everything passes so registration stays reachable.
    if !snapshot.registered {
        tracing::debug!(target: "agent.middleware.auth", "Agent unregistered, allowing request");
        record_auth_decision("bypass_unregistered");
        return Ok(next.run(req).await);
    }

    if let Some((stored_token, stored_info)) = snapshot.credentials {
        let outcome = state
            .validator
            .validate(&stored_token)
            .await
            .map_err(keyset_unavailable)?;
        if outcome.is_some() {
            tracing::debug!(target: "agent.middleware.auth", "Stored session valid");
            record_auth_decision("session_valid");
            req.extensions_mut().insert(stored_info);
            return Ok(next.run(req).await);
        }

        // Stored token no longer validates: drop token and identity
        // together, then fall through to the header check.
        tracing::info!(
            target: "agent.middleware.auth",
            "Stored session invalid, clearing credentials"
        );
        state.session.clear_credentials().await;
    }

    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer "));

    match bearer {
        None => {
            tracing::debug!(target: "agent.middleware.auth", "No credentials presented");
            record_auth_decision("unauthenticated");
            Err(HostError::Unauthenticated(
                "no session and no Authorization header".to_string(),
            ))
        }
        Some(None) => {
            // Header present but not Bearer-shaped: credentials were
            // offered and rejected, which is forbidden, not unauthenticated.
            tracing::debug!(target: "agent.middleware.auth", "Malformed Authorization header");
            record_auth_decision("forbidden");
            Err(HostError::Forbidden(
                "Authorization header is not a Bearer token".to_string(),
            ))
        }
        Some(Some(token)) => match state
            .validator
            .validate(token)
            .await
            .map_err(keyset_unavailable)?
        {
            Some(claims) => {
                tracing::debug!(target: "agent.middleware.auth", "Header token valid");
                record_auth_decision("header_valid");
                req.extensions_mut().insert(UserInfo::from_claims(&claims));
                Ok(next.run(req).await)
            }
            None => {
                record_auth_decision("forbidden");
                Err(HostError::Forbidden(
                    "bearer token failed validation".to_string(),
                ))
            }
        },
    }
}

/// Key set failures surface as 503, recorded under their own outcome.
fn keyset_unavailable(err: crate::auth::KeySetError) -> HostError {
    record_auth_decision("keyset_unavailable");
    HostError::from(err)
}

/// Extension trait for extracting the authenticated identity from a request.
#[allow(dead_code)] // API for handlers that need the identity directly
pub trait UserInfoExt {
    /// Get the authenticated identity from request extensions.
    ///
    /// Returns `None` if the gate allowed the request without attaching one
    /// (unregistered bypass) or the gate was not applied.
    fn user_info(&self) -> Option<&UserInfo>;
}

#[allow(dead_code)]
impl<B> UserInfoExt for axum::extract::Request<B> {
    fn user_info(&self) -> Option<&UserInfo> {
        self.extensions().get::<UserInfo>()
    }
}
