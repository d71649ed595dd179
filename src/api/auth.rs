//! Customer authentication API endpoints
//!
//! - POST /api/auth/register - Create an account and start a session
//! - POST /api/auth/login - Start a session
//! - POST /api/auth/logout - End the session
//! - GET /api/auth/me - Current user
//! - PUT /api/auth/profile - Update name, phone or avatar
//! - PUT /api/auth/password - Change password
//! - POST /api/auth/avatar - Upload a new avatar
//! - POST /api/auth/forgot-password - Mail a reset link
//! - POST /api/auth/reset-password - Set a new password with the mailed token

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{
    check_login_limits, clear_session_cookie, cookie_header, session_cookie, AppState, ClientIp,
    CurrentUser, USER_SESSION_COOKIE,
};
use crate::api::responses::{message, ok, ApiError, ApiJson};
use crate::api::upload::{discard_avatar, store_avatar};
use crate::models::User;
use crate::services::{RegisterInput, ServiceError, SessionKind, UpdateProfileInput};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Session payload returned by register and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

/// Routes that need no session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Routes behind `require_user`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/avatar", post(upload_avatar))
}

/// Issue a user token and build the response with its cookie
fn start_session(
    state: &AppState,
    status: StatusCode,
    user: User,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .tokens
        .issue(user.id, SessionKind::User, "user")
        .map_err(ApiError::internal)?;
    let max_age = state.tokens.lifetime_seconds();
    let cookie = session_cookie(
        USER_SESSION_COOKIE,
        &token,
        max_age,
        state.config.auth.secure_cookies,
    );

    Ok((
        status,
        [(header::SET_COOKIE, cookie_header(&cookie)?)],
        ok(SessionResponse {
            user,
            token,
            expires_in: max_age,
        }),
    ))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;
    start_session(&state, StatusCode::CREATED, user)
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = format!("user:{}", body.email.trim().to_lowercase());
    check_login_limits(&state.rate_limiter, ip, &identifier).await?;

    let user = match state.user_service.login(&body.email, &body.password).await {
        Ok(user) => user,
        Err(e @ ServiceError::Unauthorized(_)) => {
            state.rate_limiter.record_failed_attempt(&identifier).await;
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    state.rate_limiter.clear_identifier(&identifier).await;
    tracing::info!(user_id = user.id, "User logged in");
    start_session(&state, StatusCode::OK, user)
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cookie = clear_session_cookie(USER_SESSION_COOKIE, state.config.auth.secure_cookies);
    Ok((
        [(header::SET_COOKIE, cookie_header(&cookie)?)],
        message("Logged out"),
    ))
}

/// GET /api/auth/me
async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ok(user)
}

/// PUT /api/auth/profile
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<UpdateProfileInput>,
) -> Result<impl IntoResponse, ApiError> {
    let previous = user.avatar;
    let user = state.user_service.update_profile(user.id, body).await?;
    if let Some(old) = previous.filter(|old| user.avatar.as_ref() != Some(old)) {
        discard_avatar(&state, user.id, &old).await;
    }
    Ok(ok(user))
}

/// PUT /api/auth/password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(message("Password updated"))
}

/// POST /api/auth/avatar
///
/// Multipart with a single `file` field. Only raster images are accepted;
/// the previous avatar object is removed once the new one is saved.
async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let uploaded = store_avatar(&state, user.id, field).await?;
        let updated = state.user_service.set_avatar(user.id, uploaded.url).await?;
        if let Some(old) = user.avatar {
            discard_avatar(&state, user.id, &old).await;
        }
        return Ok(ok(updated));
    }

    Err(ApiError::validation("No file provided"))
}

/// POST /api/auth/forgot-password
///
/// Answers the same way whether or not the address has an account.
async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_service.request_password_reset(&body.email).await?;
    Ok(message(
        "If an account exists for that email, a reset link has been sent",
    ))
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_service
        .reset_password(&body.token, &body.password)
        .await?;
    Ok(message("Password has been reset, you can now log in"))
}
