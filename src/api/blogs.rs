//! Blog API endpoints
//!
//! Public:
//! - GET /api/blogs - Published posts (filters `category`, `tag`, `q`)
//! - GET /api/blogs/{slug} - Published post by slug
//! - GET /api/blog-categories - Categories with post counts
//!
//! Admin:
//! - GET, POST /api/admin/blogs
//! - GET, PUT, DELETE /api/admin/blogs/{id}
//! - POST /api/admin/blog-categories
//! - PUT, DELETE /api/admin/blog-categories/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use crate::api::common::{AdminPageQuery, PageQuery};
use crate::api::middleware::{AppState, CurrentAdmin};
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::{BlogCategoryInput, BlogFilter, CreateBlogInput, UpdateBlogInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs))
        .route("/{slug}", get(get_blog))
}

pub fn public_category_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_blogs).post(create_blog))
        .route(
            "/{id}",
            get(admin_get_blog).put(update_blog).delete(delete_blog),
        )
}

pub fn admin_category_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
}

/// GET /api/blogs
async fn list_blogs(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BlogFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.blog_service.list_public(&filter, &page.params()).await?;
    Ok(ok(result))
}

/// GET /api/blogs/{slug}
///
/// Counts a view.
async fn get_blog(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.blog_service.get_published_by_slug(&slug).await?))
}

/// GET /api/blog-categories
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.blog_service.list_categories().await?))
}

/// GET /api/admin/blogs
async fn admin_list_blogs(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BlogFilter>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.blog_service.list_admin(&filter, &page.params()).await?;
    Ok(ok(result))
}

/// POST /api/admin/blogs
async fn create_blog(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    ApiJson(body): ApiJson<CreateBlogInput>,
) -> Result<impl IntoResponse, ApiError> {
    let blog = state.blog_service.create(admin.id, body).await?;
    Ok((StatusCode::CREATED, ok(blog)))
}

/// GET /api/admin/blogs/{id}
async fn admin_get_blog(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.blog_service.get(id).await?))
}

/// PUT /api/admin/blogs/{id}
async fn update_blog(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateBlogInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.blog_service.update(id, body).await?))
}

/// DELETE /api/admin/blogs/{id}
async fn delete_blog(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.blog_service.delete(id).await?;
    Ok(message("Blog post deleted"))
}

/// POST /api/admin/blog-categories
async fn create_category(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BlogCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.blog_service.create_category(body).await?;
    Ok((StatusCode::CREATED, ok(category)))
}

/// PUT /api/admin/blog-categories/{id}
async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<BlogCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.blog_service.update_category(id, body).await?))
}

/// DELETE /api/admin/blog-categories/{id}
async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.blog_service.delete_category(id).await?;
    Ok(message("Category deleted"))
}
