use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::catalog::BlogPostResponse,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/blog",
    responses((status = 200, description = "Posts, newest first", body = [BlogPostResponse])),
    tag = "Content"
)]
pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPostResponse>>, AppError> {
    let posts = state.store.posts.list().await?;
    Ok(Json(posts.into_iter().map(BlogPostResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = BlogPostResponse),
        (status = 404, description = "Post not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Content"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPostResponse>, AppError> {
    let post = state
        .store
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(Json(post.into()))
}
