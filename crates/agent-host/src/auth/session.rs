//! Process-local authenticated session state.
//!
//! One `Session` lives for the whole process, initialized unregistered at
//! startup. All reads and mutations go through a single `RwLock`, so the
//! paired `(auth_token, user_info)` fields are only ever observed together:
//! a decision sees either both set or both cleared, never a half-updated
//! view.

use crate::auth::claims::UserInfo;
use tokio::sync::RwLock;

/// The guarded fields. Token and identity are stored and cleared as a pair.
#[derive(Default)]
struct SessionInner {
    registered: bool,
    auth_token: Option<String>,
    user_info: Option<UserInfo>,
}

/// One consistent view of the session, taken under a single lock
/// acquisition.
///
/// `credentials` is populated only when both the stored token and the
/// stored identity are present, which encodes the paired invariant in the
/// type: a snapshot can never expose one without the other.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Whether the agent has completed registration.
    pub registered: bool,

    /// The trusted `(token, identity)` pair, if any.
    pub credentials: Option<(String, UserInfo)>,
}

/// Process-wide session state.
pub struct Session {
    inner: RwLock<SessionInner>,
}

impl Session {
    /// Create a fresh session: unregistered, no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionInner::default()),
        }
    }

    /// Take one consistent view for a single access decision.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read().await;
        let credentials = match (&inner.auth_token, &inner.user_info) {
            (Some(token), Some(info)) => Some((token.clone(), info.clone())),
            _ => None,
        };
        SessionSnapshot {
            registered: inner.registered,
            credentials,
        }
    }

    /// Mark the agent as registered without storing credentials.
    pub async fn mark_registered(&self) {
        let mut inner = self.inner.write().await;
        inner.registered = true;
    }

    /// Store a trusted `(token, identity)` pair and mark the agent
    /// registered, all under one write lock.
    pub async fn store_credentials(&self, token: String, info: UserInfo) {
        let mut inner = self.inner.write().await;
        inner.registered = true;
        inner.auth_token = Some(token);
        inner.user_info = Some(info);
    }

    /// Clear the stored token and identity together. Registration status is
    /// untouched.
    ///
    /// Called when a stored token fails validation; the next request falls
    /// back to header-based authentication.
    pub async fn clear_credentials(&self) {
        let mut inner = self.inner.write().await;
        inner.auth_token = None;
        inner.user_info = None;
        tracing::debug!(target: "agent.auth.session", "Stored credentials cleared");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
