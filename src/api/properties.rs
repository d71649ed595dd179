//! Property listing API endpoints
//!
//! Public:
//! - GET /api/properties - Search published listings
//! - GET /api/properties/{slug} - Published listing by slug
//!
//! Admin:
//! - GET, POST /api/admin/properties
//! - GET, PUT, DELETE /api/admin/properties/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::common::{AdminPageQuery, PageQuery};
use crate::api::middleware::AppState;
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::{CreatePropertyInput, PropertyFilter, UpdatePropertyInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_properties))
        .route("/{slug}", get(get_property))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_properties).post(create_property))
        .route(
            "/{id}",
            get(admin_get_property)
                .put(update_property)
                .delete(delete_property),
        )
}

/// GET /api/properties
async fn list_properties(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .property_service
        .list_public(filter, &page.params())
        .await?;
    Ok(ok(result))
}

/// GET /api/properties/{slug}
async fn get_property(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let property = state.property_service.get_published_by_slug(&slug).await?;
    Ok(ok(property))
}

/// GET /api/admin/properties
async fn admin_list_properties(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .property_service
        .list_admin(filter, &page.params())
        .await?;
    Ok(ok(result))
}

/// POST /api/admin/properties
async fn create_property(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreatePropertyInput>,
) -> Result<impl IntoResponse, ApiError> {
    let property = state.property_service.create(body).await?;
    Ok((StatusCode::CREATED, ok(property)))
}

/// GET /api/admin/properties/{id}
async fn admin_get_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.property_service.get_by_id(id).await?))
}

/// PUT /api/admin/properties/{id}
async fn update_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdatePropertyInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.property_service.update(id, body).await?))
}

/// DELETE /api/admin/properties/{id}
async fn delete_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.property_service.delete(id).await?;
    Ok(message("Property deleted"))
}
