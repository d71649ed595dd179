//! API middleware and shared request state
//!
//! Contains:
//! - `AppState`, the services every handler can reach
//! - session extraction (bearer header or cookie) and the session cookies
//! - `require_user`, `require_admin` and `require_super_admin`
//! - the login rate limit check shared by both login endpoints

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::api::responses::ApiError;
use crate::cache::{create_cache, SharedCache};
use crate::config::Config;
use crate::db::repositories::{
    SqlxAdminRepository, SqlxBlogCategoryRepository, SqlxBlogRepository, SqlxInquiryRepository,
    SqlxNewsletterRepository, SqlxPasswordResetRepository, SqlxPropertyRepository,
    SqlxPurchaseRepository, SqlxUserRepository, SqlxWishlistRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{Admin, User};
use crate::services::{
    AdminService, BlogService, EmailService, InquiryService, LoginRateLimiter, NewsletterService,
    PropertyService, PurchaseService, ServiceError, SessionKind, StatsService, TokenService,
    UserService, WishlistService,
};
use crate::storage::DynStorage;

/// Cookie carrying a user session
pub const USER_SESSION_COOKIE: &str = "hay_session";
/// Cookie carrying an admin session
pub const ADMIN_SESSION_COOKIE: &str = "hay_admin_session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: DynDatabasePool,
    pub cache: SharedCache,
    pub storage: DynStorage,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub user_service: Arc<UserService>,
    pub admin_service: Arc<AdminService>,
    pub property_service: Arc<PropertyService>,
    pub purchase_service: Arc<PurchaseService>,
    pub blog_service: Arc<BlogService>,
    pub wishlist_service: Arc<WishlistService>,
    pub inquiry_service: Arc<InquiryService>,
    pub newsletter_service: Arc<NewsletterService>,
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(config: Config, pool: DynDatabasePool, storage: DynStorage) -> Self {
        let cache = create_cache(&config.cache);

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let admin_repo = SqlxAdminRepository::boxed(pool.clone());
        let property_repo = SqlxPropertyRepository::boxed(pool.clone());
        let purchase_repo = SqlxPurchaseRepository::boxed(pool.clone());
        let blog_repo = SqlxBlogRepository::boxed(pool.clone());
        let blog_category_repo = SqlxBlogCategoryRepository::boxed(pool.clone());
        let inquiry_repo = SqlxInquiryRepository::boxed(pool.clone());
        let newsletter_repo = SqlxNewsletterRepository::boxed(pool.clone());

        let email = Arc::new(EmailService::new(config.mail.clone()));
        let property_service = Arc::new(PropertyService::new(
            property_repo.clone(),
            purchase_repo.clone(),
            cache.clone(),
        ));
        let purchase_service = Arc::new(PurchaseService::new(
            purchase_repo.clone(),
            user_repo.clone(),
            property_service.clone(),
        ));

        Self {
            tokens: Arc::new(TokenService::new(&config.auth.jwt_secret, config.auth.session_days)),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            user_service: Arc::new(UserService::new(
                user_repo.clone(),
                SqlxPasswordResetRepository::boxed(pool.clone()),
                email,
                config.server.public_url.clone(),
            )),
            admin_service: Arc::new(AdminService::new(
                admin_repo,
                user_repo.clone(),
                purchase_service.clone(),
            )),
            purchase_service,
            property_service,
            blog_service: Arc::new(BlogService::new(
                blog_repo.clone(),
                blog_category_repo,
                cache.clone(),
            )),
            wishlist_service: Arc::new(WishlistService::new(
                SqlxWishlistRepository::boxed(pool.clone()),
                property_repo.clone(),
            )),
            inquiry_service: Arc::new(InquiryService::new(
                inquiry_repo.clone(),
                property_repo.clone(),
            )),
            newsletter_service: Arc::new(NewsletterService::new(newsletter_repo.clone())),
            stats_service: Arc::new(StatsService::new(
                user_repo,
                property_repo,
                purchase_repo,
                blog_repo,
                inquiry_repo,
                newsletter_repo,
            )),
            config: Arc::new(config),
            pool,
            cache,
            storage,
        }
    }
}

/// The logged-in user, inserted by `require_user`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The logged-in admin, inserted by `require_admin`
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Admin);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Admin authentication required"))
    }
}

/// Best-effort client address: proxy headers first, then the socket peer
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_ip(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        });
        Ok(ClientIp(ip))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // First hop in X-Forwarded-For is the original client
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next().and_then(|s| s.trim().parse().ok()) {
            return Some(ip);
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Session token from `Authorization: Bearer` or, failing that, the named cookie
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth_str) = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_str) = cookie_header.to_str() else {
            continue;
        };
        for cookie in cookie_str.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == cookie_name && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(name: &str, token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

pub fn cookie_header(cookie: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(cookie).map_err(ApiError::internal)
}

/// User authentication middleware
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers(), USER_SESSION_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let claims = state
        .tokens
        .verify_kind(&token, SessionKind::User)
        .map_err(|e| {
            tracing::debug!("Rejected user session: {}", e);
            ApiError::unauthorized("Invalid or expired session")
        })?;

    let user = match state.user_service.get_by_id(claims.sub).await {
        Ok(user) => user,
        Err(ServiceError::NotFound(_)) => {
            return Err(ApiError::unauthorized("Invalid or expired session"))
        }
        Err(e) => return Err(e.into()),
    };
    if user.is_suspended() {
        return Err(ApiError::forbidden("This account has been suspended"));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Admin authentication middleware
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers(), ADMIN_SESSION_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Admin authentication required"))?;

    let claims = state
        .tokens
        .verify_kind(&token, SessionKind::Admin)
        .map_err(|e| {
            tracing::debug!("Rejected admin session: {}", e);
            ApiError::unauthorized("Invalid or expired session")
        })?;

    let admin = match state.admin_service.get_admin(claims.sub).await {
        Ok(admin) => admin,
        Err(ServiceError::NotFound(_)) => {
            return Err(ApiError::unauthorized("Invalid or expired session"))
        }
        Err(e) => return Err(e.into()),
    };

    request.extensions_mut().insert(CurrentAdmin(admin));
    Ok(next.run(request).await)
}

/// Super admin authorization middleware; runs after `require_admin`
pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let admin = request
        .extensions()
        .get::<CurrentAdmin>()
        .ok_or_else(|| ApiError::unauthorized("Admin authentication required"))?;

    if !admin.0.is_super_admin() {
        return Err(ApiError::forbidden("Super admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Apply the per-IP and per-identifier login limits.
///
/// Counts the request against the IP window; failed attempts are recorded
/// by the caller once the credentials are known to be wrong.
pub async fn check_login_limits(
    limiter: &LoginRateLimiter,
    ip: Option<IpAddr>,
    identifier: &str,
) -> Result<(), ApiError> {
    if let Some(ip) = ip {
        if limiter.is_ip_limited(ip).await {
            tracing::warn!(%ip, "Login rate limit exceeded for address");
            return Err(ApiError::rate_limited(
                "Too many login requests, please try again in a minute",
            ));
        }
        limiter.record_ip_request(ip).await;
    }

    if limiter.is_identifier_limited(identifier).await {
        tracing::warn!(identifier, "Too many failed logins");
        return Err(ApiError::rate_limited(
            "Too many failed login attempts, please try again in 15 minutes",
        ));
    }

    Ok(())
}
