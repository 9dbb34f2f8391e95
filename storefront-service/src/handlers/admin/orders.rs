use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        admin::{OrderPage, PageMeta, PageQuery, StatusUpdateRequest},
        order::OrderResponse,
        MessageResponse,
    },
    middleware::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(PageQuery),
    responses((status = 200, description = "Orders, newest first", body = OrderPage)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderPage>, AppError> {
    let limit = i64::try_from(query.limit()).unwrap_or(i64::MAX);
    let (orders, total) = state.store.orders.list_page(query.skip(), limit).await?;

    Ok(Json(OrderPage {
        data: orders.into_iter().map(OrderResponse::from).collect(),
        meta: PageMeta::new(total, &query),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .store
        .orders
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    Ok(Json(order.into()))
}

/// Fulfilment status. Payment state is only changed by the payment paths.
#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = OrderResponse),
        (status = 400, description = "Payment status requested", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    if req.status.is_payment_outcome() {
        return Err(AppError::bad_request(format!(
            "Status {} is set by payment confirmation only",
            req.status.as_str()
        )));
    }

    let order = state
        .store
        .orders
        .update_status(&id, req.status)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    tracing::info!(order_id = %order.id, status = req.status.as_str(), admin_id = %admin.id, "Order status updated");

    Ok(Json(order.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.orders.delete(&id).await? {
        return Err(AppError::not_found("Order not found"));
    }

    tracing::info!(order_id = %id, admin_id = %admin.id, "Order deleted");

    Ok(Json(MessageResponse::new("Order removed")))
}
