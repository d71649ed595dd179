//! API layer - HTTP handlers and routing
//!
//! Everything is served under `/api`. Customer routes use the
//! `hay_session` cookie, back office routes the `hay_admin_session` cookie;
//! both also accept a bearer token.

pub mod admin;
pub mod auth;
pub mod blogs;
pub mod common;
pub mod inquiries;
pub mod middleware;
pub mod newsletter;
pub mod properties;
pub mod purchases;
pub mod responses;
pub mod upload;
pub mod wishlist;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::StorageDriver;

pub use middleware::{AppState, CurrentAdmin, CurrentUser};
pub use responses::{ApiError, ApiResponse};

/// Multipart framing allowance on top of the file bytes
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Policy for stored uploads; an uploaded SVG opened directly runs no script
const UPLOAD_CSP: &str = "default-src 'none'; img-src 'self'; style-src 'unsafe-inline'; sandbox";

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let max_file = usize::try_from(state.config.upload.max_file_size).unwrap_or(usize::MAX);
    let single_upload_limit = max_file.saturating_add(MULTIPART_OVERHEAD);
    let multi_upload_limit = max_file
        .saturating_mul(upload::MAX_FILES_PER_REQUEST)
        .saturating_add(MULTIPART_OVERHEAD);

    // Super admin routes
    let super_admin_routes = admin::super_admin_router()
        .route_layer(axum_middleware::from_fn(middleware::require_super_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    // Admin routes
    let admin_routes = Router::new()
        .merge(admin::router())
        .nest("/properties", properties::admin_router())
        .nest("/blogs", blogs::admin_router())
        .nest("/blog-categories", blogs::admin_category_router())
        .nest("/purchases", purchases::admin_router())
        .nest("/inquiries", inquiries::admin_router())
        .nest("/newsletter", newsletter::admin_router())
        .nest(
            "/uploads",
            upload::router().layer(DefaultBodyLimit::max(multi_upload_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ))
        .merge(super_admin_routes)
        .merge(admin::public_router());

    // Customer routes
    let user_routes = Router::new()
        .nest(
            "/auth",
            auth::protected_router().layer(DefaultBodyLimit::max(single_upload_limit)),
        )
        .nest("/wishlist", wishlist::router())
        .nest("/purchases", purchases::user_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_user,
        ));

    // Public routes
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::public_router())
        .nest("/properties", properties::public_router())
        .nest("/blogs", blogs::public_router())
        .nest("/blog-categories", blogs::public_category_router())
        .nest("/inquiries", inquiries::public_router())
        .nest("/newsletter", newsletter::public_router())
        .nest("/admin", admin_routes)
        .merge(user_routes)
}

/// Build the complete application router with middleware
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new().nest("/api", build_api_router(state.clone()));

    // Local uploads are served by the app itself, never as active content
    let storage = &state.config.storage;
    if storage.driver == StorageDriver::Local {
        let uploads = ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(UPLOAD_CSP),
            ))
            .service(ServeDir::new(&storage.local_path));
        app = app.nest_service(storage.local_url_prefix.as_str(), uploads);
    }

    app.fallback(route_not_found)
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the web frontend; cookies need an explicit origin list
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if cors_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    storage: &'static str,
    version: &'static str,
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {:#}", e);
            "unavailable"
        }
    };

    responses::ok(HealthResponse {
        status: "ok",
        database,
        storage: state.storage.name(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
