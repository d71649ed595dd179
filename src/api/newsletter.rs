//! Newsletter API endpoints
//!
//! - POST /api/newsletter/subscribe
//! - POST /api/newsletter/unsubscribe
//! - GET /api/admin/newsletter - Subscribers (active only unless `include_inactive=true`)

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::AdminPageQuery;
use crate::api::middleware::AppState;
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", get(list_subscribers))
}

/// POST /api/newsletter/subscribe
async fn subscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.newsletter_service.subscribe(&body.email).await?))
}

/// POST /api/newsletter/unsubscribe
async fn unsubscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.newsletter_service.unsubscribe(&body.email).await?;
    Ok(message("You have been unsubscribed"))
}

/// GET /api/admin/newsletter
async fn list_subscribers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SubscriberQuery>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .newsletter_service
        .list(!query.include_inactive, &page.params())
        .await?;
    Ok(ok(result))
}
