//! Purchase tracker API endpoints
//!
//! Buyer:
//! - GET /api/purchases - Own purchases with progress
//! - GET /api/purchases/{id} - One own purchase
//!
//! Admin:
//! - GET, POST /api/admin/purchases
//! - GET, PUT, DELETE /api/admin/purchases/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::common::AdminPageQuery;
use crate::api::middleware::{AppState, CurrentUser};
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::{CreatePurchaseInput, PurchaseFilter, UpdatePurchaseInput};

/// Routes behind `require_user`
pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_purchases))
        .route("/{id}", get(get_my_purchase))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route(
            "/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}

/// GET /api/purchases
async fn list_my_purchases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.purchase_service.list_for_user(user.id).await?))
}

/// GET /api/purchases/{id}
///
/// Another buyer's purchase answers 404.
async fn get_my_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.purchase_service.get_for_user(user.id, id).await?))
}

/// GET /api/admin/purchases
async fn list_purchases(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PurchaseFilter>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.purchase_service.list(&filter, &page.params()).await?))
}

/// POST /api/admin/purchases
async fn create_purchase(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreatePurchaseInput>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state.purchase_service.create(body).await?;
    Ok((StatusCode::CREATED, ok(purchase)))
}

/// GET /api/admin/purchases/{id}
async fn get_purchase(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.purchase_service.get_view(id).await?))
}

/// PUT /api/admin/purchases/{id}
async fn update_purchase(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdatePurchaseInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.purchase_service.update(id, body).await?))
}

/// DELETE /api/admin/purchases/{id}
async fn delete_purchase(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.purchase_service.delete(id).await?;
    Ok(message("Purchase deleted"))
}
