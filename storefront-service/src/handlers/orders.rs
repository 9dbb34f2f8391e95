use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::order::OrderResponse,
    middleware::AuthUser,
    models::{Order, User},
    AppState,
};

/// Loads an order the caller may see: its owner or any admin.
pub(crate) async fn load_visible_order(
    state: &AppState,
    user: &User,
    order_id: &str,
) -> Result<Order, AppError> {
    let order = state
        .store
        .orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if !order.is_owned_by(&user.id) && !user.is_admin {
        tracing::warn!(order_id = %order.id, user_id = %user.id, "Order access denied");
        return Err(AppError::forbidden("Forbidden"));
    }

    Ok(order)
}

#[utoipa::path(
    get,
    path = "/api/orders/myorders",
    responses((status = 200, description = "Caller's orders, newest first", body = [OrderResponse])),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.store.orders.list_for_user(&user.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 403, description = "Not the owner", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = load_visible_order(&state, &user, &id).await?;
    Ok(Json(order.into()))
}
