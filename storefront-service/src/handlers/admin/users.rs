use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        admin::RoleUpdateRequest,
        auth::{UserResponse, UserSummary},
        MessageResponse,
    },
    middleware::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Users, newest first", body = [UserResponse])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.store.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    params(("id" = String, Path, description = "User id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = UserSummary),
        (status = 400, description = "Cannot revoke own admin role", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RoleUpdateRequest>,
) -> Result<Json<UserSummary>, AppError> {
    if id == admin.id && !req.is_admin {
        return Err(AppError::bad_request("You cannot remove your own admin role"));
    }

    let user = state
        .store
        .users
        .set_admin(&id, req.is_admin)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, admin_id = %admin.id, "User role updated");

    Ok(Json(UserSummary::from(&user)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete yourself", body = crate::dtos::ErrorResponse),
        (status = 404, description = "User not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if id == admin.id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    if !state.store.users.delete(&id).await? {
        return Err(AppError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, admin_id = %admin.id, "User deleted");

    Ok(Json(MessageResponse::new("User removed")))
}
