use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::User, AppState};

/// Requires `Authorization: Bearer <jwt>` and loads the caller from the
/// store, so role changes and deletions take effect on the next request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Not authorized, no token"))?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::unauthorized("Not authorized, token failed")
    })?;

    let user = state
        .store
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Not authorized, user not found"))?;

    req.extensions_mut().insert(AuthUser(user));

    Ok(next.run(req).await)
}

/// The authenticated caller, as stored.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Not authorized"))
    }
}
