use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Register a new customer account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = AuthResponse),
        (status = 400, description = "User already exists", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = state.accounts.register(req).await?;
    Ok(Json(res))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid credentials", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::dtos::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = state.accounts.login(req).await?;
    Ok(Json(res))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
