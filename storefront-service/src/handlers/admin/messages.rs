use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        admin::{CountResponse, MessageView},
        SuccessResponse,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/messages",
    responses((status = 200, description = "Messages, newest first", body = [MessageView])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = state.store.messages.list().await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/admin/messages/count",
    responses((status = 200, description = "Number of messages", body = CountResponse)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn count_messages(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.store.messages.count().await?;
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/messages/{id}",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 404, description = "Message not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.store.messages.delete(&id).await? {
        return Err(AppError::not_found("Message not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
