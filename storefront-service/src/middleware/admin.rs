use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use super::AuthUser;

/// Runs after [`super::auth_middleware`]; lets only admins through.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(AuthUser(user)) if user.is_admin => Ok(next.run(request).await),
        Some(AuthUser(user)) => {
            tracing::warn!(user_id = %user.id, path = %request.uri().path(), "Non-admin denied");
            Err(AppError::forbidden("Admin only"))
        }
        None => Err(AppError::unauthorized("Not authorized")),
    }
}
