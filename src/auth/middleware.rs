use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{auth::jwt::JwtKeys, error::AppError, state::AppState};

/// Caller identity decoded from the token. Role is carried, not enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: String,
}

/// Gate for protected routes. The `authorization` header holds the raw token,
/// without a `Bearer` scheme.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::AccessDenied)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::InvalidToken
    })?;

    debug!(user_id = claims.id, role = %claims.role, "request authenticated");
    request.extensions_mut().insert(AuthUser {
        id: claims.id,
        role: claims.role,
    });
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when `require_auth` ran for this route.
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::AccessDenied)
    }
}
