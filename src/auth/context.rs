use axum::http::HeaderMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::SessionCodec;
use crate::database::{Store, User};
use crate::error::RpcError;

/// Lets a handler ask the transport to clear the session cookie once the call completes
#[derive(Debug, Clone, Default)]
pub struct SessionControl {
    clear: Arc<AtomicBool>,
}

impl SessionControl {
    pub fn clear_session(&self) {
        self.clear.store(true, Ordering::SeqCst);
    }

    pub fn should_clear(&self) -> bool {
        self.clear.load(Ordering::SeqCst)
    }
}

/// Per-request context built before dispatch. Immutable once built, apart from the
/// session-control flag.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<User>,
    pub session: SessionControl,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            session: SessionControl::default(),
            request_id: Uuid::new_v4(),
        }
    }

    pub fn for_user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::anonymous()
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The identity, for handlers that are only reachable past the authenticated tier
    pub fn require_user(&self) -> Result<&User, RpcError> {
        self.user
            .as_ref()
            .ok_or_else(|| RpcError::unauthorized("Please login"))
    }
}

/// Build the request context from session evidence. Bad or missing evidence yields an
/// anonymous context; only a store failure is an error.
pub async fn resolve(
    store: &dyn Store,
    codec: &SessionCodec,
    headers: &HeaderMap,
) -> Result<RequestContext, RpcError> {
    let Some(token) = codec.token_from_headers(headers) else {
        return Ok(RequestContext::anonymous());
    };

    let claims = match codec.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring session evidence: {}", e);
            return Ok(RequestContext::anonymous());
        }
    };

    match store.user_by_open_id(&claims.open_id).await? {
        Some(user) => Ok(RequestContext::for_user(user)),
        None => {
            tracing::warn!(open_id = %claims.open_id, "Session token refers to unknown identity");
            Ok(RequestContext::anonymous())
        }
    }
}
