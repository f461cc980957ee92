//! Request extractors for authenticated callers

use arkive_access::Identity;
use arkive_core::ArkiveError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{AppState, WebError};

/// The authenticated caller, established once per request.
///
/// The credential is read from the `Authorization` header, falling back
/// to `Authenticate`, with an optional `Bearer ` prefix. The raw token is
/// kept so logout can revoke exactly what was presented.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    pub token: String,
}

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get("authorization")
            .or_else(|| parts.headers.get("authenticate"))
            .and_then(|value| value.to_str().ok())
            .ok_or(WebError::Access(ArkiveError::Unauthenticated))?;

        let identity = app_state.access.authenticate(header)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).to_string();

        Ok(AuthUser { identity, token })
    }
}
