//! Wishlist API endpoints (all behind `require_user`)
//!
//! - GET /api/wishlist - Saved properties
//! - POST /api/wishlist/{property_id} - Save a property
//! - DELETE /api/wishlist/{property_id} - Remove a property

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::api::middleware::{AppState, CurrentUser};
use crate::api::responses::{ok, ApiError, ApiPath};

#[derive(Debug, Serialize)]
pub struct WishlistChange {
    pub property_id: i64,
    pub saved: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/{property_id}", post(add_to_wishlist).delete(remove_from_wishlist))
}

/// GET /api/wishlist
async fn list_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.wishlist_service.list(user.id).await?))
}

/// POST /api/wishlist/{property_id}
async fn add_to_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(property_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.wishlist_service.add(user.id, property_id).await?;
    Ok(ok(WishlistChange {
        property_id,
        saved: true,
    }))
}

/// DELETE /api/wishlist/{property_id}
async fn remove_from_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(property_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.wishlist_service.remove(user.id, property_id).await?;
    Ok(ok(WishlistChange {
        property_id,
        saved: false,
    }))
}
