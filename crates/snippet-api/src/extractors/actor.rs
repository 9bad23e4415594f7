//! `Actor` extractor: reads the user id forwarded by the upstream auth layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use snippet_core::error::AppError;
use snippet_service::context::RequestContext;

/// Header carrying the authenticated user's id.
pub const ACTOR_HEADER: &str = "x-user-id";

/// The acting user, available in handlers that write.
#[derive(Debug, Clone)]
pub struct Actor(pub RequestContext);

impl Actor {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for Actor {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| AppError::authentication("Missing X-User-Id header"))?;

        let user_id = value
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::authentication("Invalid X-User-Id header"))?;

        Ok(Actor(RequestContext::new(user_id)))
    }
}
