//! Inquiry API endpoints
//!
//! - POST /api/inquiries - Contact form (public)
//! - GET /api/admin/inquiries - List, optionally by status
//! - PUT /api/admin/inquiries/{id} - Change status
//! - DELETE /api/admin/inquiries/{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

use crate::api::common::AdminPageQuery;
use crate::api::middleware::AppState;
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::{CreateInquiryInput, InquiryStatus};

#[derive(Debug, Default, Deserialize)]
pub struct InquiryQuery {
    pub status: Option<InquiryStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: InquiryStatus,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", post(submit_inquiry))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inquiries))
        .route("/{id}", put(update_inquiry).delete(delete_inquiry))
}

/// POST /api/inquiries
async fn submit_inquiry(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateInquiryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let inquiry = state.inquiry_service.submit(body).await?;
    Ok((StatusCode::CREATED, ok(inquiry)))
}

/// GET /api/admin/inquiries
async fn list_inquiries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InquiryQuery>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.inquiry_service.list(query.status, &page.params()).await?))
}

/// PUT /api/admin/inquiries/{id}
async fn update_inquiry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateInquiryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.inquiry_service.set_status(id, body.status).await?))
}

/// DELETE /api/admin/inquiries/{id}
async fn delete_inquiry(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.inquiry_service.delete(id).await?;
    Ok(message("Inquiry deleted"))
}
