//! Back office API endpoints
//!
//! Session:
//! - POST /api/admin/auth/login (public)
//! - POST /api/admin/auth/logout
//! - GET /api/admin/auth/me
//!
//! Dashboard and people:
//! - GET /api/admin/stats
//! - GET, POST /api/admin/admins; DELETE /api/admin/admins/{id} (super admin)
//! - GET /api/admin/users; GET, PUT, DELETE /api/admin/users/{id}

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{AdminPageQuery, SearchQuery};
use crate::api::middleware::{
    check_login_limits, clear_session_cookie, cookie_header, session_cookie, AppState, ClientIp,
    CurrentAdmin, ADMIN_SESSION_COOKIE,
};
use crate::api::responses::{message, ok, ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::{Admin, UpdateUserInput};
use crate::services::{CreateAdminInput, ServiceError, SessionKind};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminSessionResponse {
    pub admin: Admin,
    pub token: String,
    pub expires_in: i64,
}

/// Admin login (no session required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Routes behind `require_admin`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Routes behind `require_admin` and `require_super_admin`
pub fn super_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admins", get(list_admins).post(create_admin))
        .route("/admins/{id}", delete(delete_admin))
}

/// POST /api/admin/auth/login
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(body): ApiJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = format!("admin:{}", body.email.trim().to_lowercase());
    check_login_limits(&state.rate_limiter, ip, &identifier).await?;

    let admin = match state.admin_service.login(&body.email, &body.password).await {
        Ok(admin) => admin,
        Err(e @ ServiceError::Unauthorized(_)) => {
            state.rate_limiter.record_failed_attempt(&identifier).await;
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    state.rate_limiter.clear_identifier(&identifier).await;

    let token = state
        .tokens
        .issue(admin.id, SessionKind::Admin, &admin.role.to_string())
        .map_err(ApiError::internal)?;
    let max_age = state.tokens.lifetime_seconds();
    let cookie = session_cookie(
        ADMIN_SESSION_COOKIE,
        &token,
        max_age,
        state.config.auth.secure_cookies,
    );

    Ok((
        [(header::SET_COOKIE, cookie_header(&cookie)?)],
        ok(AdminSessionResponse {
            admin,
            token,
            expires_in: max_age,
        }),
    ))
}

/// POST /api/admin/auth/logout
async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cookie = clear_session_cookie(ADMIN_SESSION_COOKIE, state.config.auth.secure_cookies);
    Ok((
        [(header::SET_COOKIE, cookie_header(&cookie)?)],
        message("Logged out"),
    ))
}

/// GET /api/admin/auth/me
async fn me(CurrentAdmin(admin): CurrentAdmin) -> impl IntoResponse {
    ok(admin)
}

/// GET /api/admin/stats
async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.stats_service.dashboard().await?))
}

/// GET /api/admin/admins
async fn list_admins(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.admin_service.list_admins().await?))
}

/// POST /api/admin/admins
async fn create_admin(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    ApiJson(body): ApiJson<CreateAdminInput>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state.admin_service.create_admin(body).await?;
    tracing::info!(admin_id = admin.id, by = actor.id, "Admin created");
    Ok((StatusCode::CREATED, ok(admin)))
}

/// DELETE /api/admin/admins/{id}
async fn delete_admin(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.admin_service.delete_admin(actor.id, id).await?;
    Ok(message("Admin deleted"))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<SearchQuery>,
    ApiQuery(page): ApiQuery<AdminPageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .admin_service
        .list_users(search.term(), &page.params())
        .await?;
    Ok(ok(result))
}

/// GET /api/admin/users/{id}
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.admin_service.get_user(id).await?))
}

/// PUT /api/admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(state.admin_service.update_user(id, body).await?))
}

/// DELETE /api/admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.admin_service.delete_user(id).await?;
    Ok(message("User deleted"))
}
