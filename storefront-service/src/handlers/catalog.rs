use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::catalog::{CategoryRequest, CategoryResponse, ProductResponse},
    models::Category,
    utils::slugify,
    AppState,
};

/// All products, newest first
#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "Products", body = [ProductResponse])),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.store.products.list().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .store
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(product.into()))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [CategoryResponse])),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.store.categories.list().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = state
        .store
        .categories
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    Ok(Json(category.into()))
}

/// Create a category (admin)
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Missing name or duplicate", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }

    if state
        .store
        .categories
        .find_by_slug(&slugify(name))
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("Category already exists"));
    }

    let category = Category::new(name.to_string(), req.image, req.description);
    state
        .store
        .categories
        .insert(&category)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::bad_request("Category already exists"),
            other => other,
        })?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

    Ok((StatusCode::CREATED, Json(category.into())))
}
