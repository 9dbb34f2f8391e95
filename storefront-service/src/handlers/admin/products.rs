use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        catalog::{ProductRequest, ProductResponse, ProductUpdateRequest},
        MessageResponse,
    },
    utils::ValidatedJson,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/products",
    responses((status = 200, description = "All products", body = [ProductResponse])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.store.products.list().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = req.into_product();
    state.store.products.insert(&product).await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(product.into())))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ProductUpdateRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let mut product = state
        .store
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    req.apply(&mut product);

    if !state.store.products.update(&product).await? {
        return Err(AppError::not_found("Product not found"));
    }

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Product not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.products.delete(&id).await? {
        return Err(AppError::not_found("Product not found"));
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(MessageResponse::new("Product removed")))
}
