use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::cart::{CartResponse, MergeCartRequest},
    middleware::AuthUser,
    models::CartItem,
    services::cart::merge_carts,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users/cart",
    responses((status = 200, description = "Saved cart", body = [CartItem])),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(AuthUser(user): AuthUser) -> Json<Vec<CartItem>> {
    Json(user.cart)
}

/// Merge a client cart into the saved one
#[utoipa::path(
    post,
    path = "/api/users/cart",
    request_body = MergeCartRequest,
    responses((status = 200, description = "Merged cart", body = CartResponse)),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn merge_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<MergeCartRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = merge_carts(&user.cart, &req.cart_items);
    state.store.users.save_cart(&user.id, &cart).await?;

    tracing::debug!(user_id = %user.id, lines = cart.len(), "Cart merged");

    Ok(Json(CartResponse {
        message: "Cart merged".to_string(),
        cart,
    }))
}
