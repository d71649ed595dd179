//! HTTP integration tests
//!
//! Each test builds the full router over an in-memory database and a
//! temporary upload directory.

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use hay_property::api::{build_router, AppState};
use hay_property::config::{AdminBootstrapConfig, Config};
use hay_property::db::{create_test_pool, migrations};
use hay_property::services::{SessionKind, TokenService};
use hay_property::storage::create_storage;

const ROOT_EMAIL: &str = "root@hay.test";
const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
const ROOT_PASSWORD: &str = "root-password";

struct TestApp {
    server: TestServer,
    state: AppState,
    _uploads: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool).await.expect("Failed to run migrations");

    let uploads = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.local_path = uploads.path().to_path_buf();
    config.upload.max_file_size = 1024;
    config.auth.jwt_secret = TEST_JWT_SECRET.into();
    let bootstrap = AdminBootstrapConfig {
        name: Some("Root".into()),
        email: Some(ROOT_EMAIL.into()),
        password: Some(ROOT_PASSWORD.into()),
    };

    let storage = create_storage(&config.storage).await.unwrap();
    let state = AppState::new(config, pool, storage);
    state.admin_service.bootstrap(&bootstrap).await.unwrap();

    let server = TestServer::new(build_router(state.clone())).unwrap();
    TestApp {
        server,
        state,
        _uploads: uploads,
    }
}

/// Register a user and return (user id, token)
async fn register(app: &TestApp, name: &str, email: &str) -> (i64, String) {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": name, "email": email, "password": "password123"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    (
        body["data"]["user"]["id"].as_i64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_string(),
    )
}

async fn admin_token(app: &TestApp) -> String {
    let response = app
        .server
        .post("/api/admin/auth/login")
        .json(&json!({"email": ROOT_EMAIL, "password": ROOT_PASSWORD}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_property(app: &TestApp, admin: &str, title: &str) -> Value {
    let response = app
        .server
        .post("/api/admin/properties")
        .authorization_bearer(admin)
        .json(&json!({
            "title": title,
            "description": "Four bedroom duplex with a garden",
            "location": "Lekki Phase 1",
            "city": "Lagos",
            "price": 95_000_000,
            "property_type": "duplex",
            "bedrooms": 4
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let response = app.server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");
    assert_eq!(body["data"]["storage"], "local");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = setup().await;
    let response = app.server.get("/api/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_register_login_me() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Ada", "email": " Ada@Example.com ", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("hay_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // Same address again
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICT");

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "password123"}))
        .await;
    response.assert_status_ok();
    let token = response.json::<Value>()["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Bearer token
    let response = app.server.get("/api/auth/me").authorization_bearer(&token).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["name"], "Ada");

    // Session cookie
    let pair = cookie.split(';').next().unwrap().to_string();
    let response = app
        .server
        .get("/api/auth/me")
        .add_header(header::COOKIE, HeaderValue::from_str(&pair).unwrap())
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_login_failures() {
    let app = setup().await;
    register(&app, "Bola", "bola@example.com").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "bola@example.com", "password": "wrong-password"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHORIZED");

    // Four more failures reach the limit
    for _ in 0..4 {
        app.server
            .post("/api/auth/login")
            .json(&json!({"email": "bola@example.com", "password": "wrong-password"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "bola@example.com", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Ada", "email": "not-an-email", "password": "password123"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "short"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Malformed body
    let response = app
        .server
        .post("/api/inquiries")
        .json(&json!({"name": "No message"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_session_gating() {
    let app = setup().await;
    let (_, user_token) = register(&app, "Chidi", "chidi@example.com").await;
    let admin = admin_token(&app).await;

    app.server.get("/api/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
    app.server.get("/api/wishlist").await.assert_status(StatusCode::UNAUTHORIZED);
    app.server.get("/api/admin/stats").await.assert_status(StatusCode::UNAUTHORIZED);

    // A user token never opens the back office
    let response = app
        .server
        .get("/api/admin/stats")
        .authorization_bearer(&user_token)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // And an admin token is not a customer session
    app.server
        .get("/api/auth/me")
        .authorization_bearer(&admin)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/admin/stats")
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    app.server
        .get("/api/auth/me")
        .authorization_bearer("not.a.token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_suspended_user_is_locked_out() {
    let app = setup().await;
    let (user_id, token) = register(&app, "Dayo", "dayo@example.com").await;
    let admin = admin_token(&app).await;

    app.server
        .put(&format!("/api/admin/users/{}", user_id))
        .authorization_bearer(&admin)
        .json(&json!({"status": "suspended"}))
        .await
        .assert_status_ok();

    app.server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post("/api/auth/login")
        .json(&json!({"email": "dayo@example.com", "password": "password123"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_admin_routes() {
    let app = setup().await;
    let root = admin_token(&app).await;

    let response = app
        .server
        .post("/api/admin/admins")
        .authorization_bearer(&root)
        .json(&json!({
            "name": "Staff",
            "email": "staff@hay.test",
            "password": "staff-password",
            "role": "admin"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let staff_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();

    let response = app
        .server
        .post("/api/admin/auth/login")
        .json(&json!({"email": "staff@hay.test", "password": "staff-password"}))
        .await;
    response.assert_status_ok();
    let staff = response.json::<Value>()["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Plain admins manage content but not admins
    app.server
        .get("/api/admin/users")
        .authorization_bearer(&staff)
        .await
        .assert_status_ok();
    app.server
        .get("/api/admin/admins")
        .authorization_bearer(&staff)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .get("/api/admin/admins")
        .authorization_bearer(&root)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 2);

    app.server
        .delete(&format!("/api/admin/admins/{}", staff_id))
        .authorization_bearer(&root)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_property_listing_flow() {
    let app = setup().await;
    let admin = admin_token(&app).await;

    let first = create_property(&app, &admin, "Garden Duplex").await;
    assert_eq!(first["slug"], "garden-duplex");
    let second = create_property(&app, &admin, "Garden Duplex").await;
    assert_eq!(second["slug"], "garden-duplex-2");

    // Unpublish the second one
    app.server
        .put(&format!("/api/admin/properties/{}", second["id"]))
        .authorization_bearer(&admin)
        .json(&json!({"is_published": false}))
        .await
        .assert_status_ok();

    let response = app.server.get("/api/properties").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["per_page"], 12);
    assert_eq!(body["data"]["items"][0]["slug"], "garden-duplex");

    let response = app
        .server
        .get("/api/properties")
        .add_query_param("min_price", 100_000_000)
        .await;
    assert_eq!(response.json::<Value>()["data"]["total"], 0);

    app.server
        .get("/api/properties/garden-duplex")
        .await
        .assert_status_ok();
    app.server
        .get("/api/properties/garden-duplex-2")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .get("/api/admin/properties")
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["data"]["total"], 2);
}

#[tokio::test]
async fn test_purchase_tracking() {
    let app = setup().await;
    let admin = admin_token(&app).await;
    let (buyer_id, buyer) = register(&app, "Efe", "efe@example.com").await;
    let (_, other) = register(&app, "Funmi", "funmi@example.com").await;
    let property = create_property(&app, &admin, "Terrace Home").await;

    let response = app
        .server
        .post("/api/admin/purchases")
        .authorization_bearer(&admin)
        .json(&json!({
            "user_id": buyer_id,
            "property_id": property["id"],
            "amount_paid": 47_500_000
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let purchase: Value = response.json::<Value>()["data"].clone();
    assert_eq!(purchase["progress"], 0);
    assert_eq!(purchase["payment_progress"], 50);
    assert_eq!(purchase["status"], "pending");
    assert_eq!(purchase["phase_list"].as_array().unwrap().len(), 8);
    let purchase_id = purchase["id"].as_i64().unwrap();

    let response = app
        .server
        .get(&format!("/api/admin/properties/{}", property["id"]))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["data"]["status"], "reserved");

    // Tick every phase
    let response = app
        .server
        .put(&format!("/api/admin/purchases/{}", purchase_id))
        .authorization_bearer(&admin)
        .json(&json!({
            "phases": {
                "land_acquisition": true, "documentation": true, "foundation": true,
                "blockwork": true, "roofing": true, "mep": true,
                "finishing": true, "handover": true
            }
        }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json::<Value>()["data"].clone();
    assert_eq!(updated["progress"], 100);
    assert_eq!(updated["status"], "completed");

    let response = app.server.get("/api/purchases").authorization_bearer(&buyer).await;
    response.assert_status_ok();
    let mine = response.json::<Value>()["data"].clone();
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["property"]["status"], "sold");

    // Someone else's purchase is invisible
    app.server
        .get(&format!("/api/purchases/{}", purchase_id))
        .authorization_bearer(&other)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/purchases/{}", purchase_id))
        .authorization_bearer(&buyer)
        .await
        .assert_status_ok();

    // Cancelling the sale puts the property back on the market
    let response = app
        .server
        .put(&format!("/api/admin/purchases/{}", purchase_id))
        .authorization_bearer(&admin)
        .json(&json!({"status": "cancelled"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "cancelled");

    let response = app
        .server
        .get(&format!("/api/admin/properties/{}", property["id"]))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["data"]["status"], "available");
}

#[tokio::test]
async fn test_deleting_user_releases_property() {
    let app = setup().await;
    let admin = admin_token(&app).await;
    let (buyer_id, _) = register(&app, "Kunle", "kunle@example.com").await;
    let property = create_property(&app, &admin, "Garden Bungalow").await;

    app.server
        .post("/api/admin/purchases")
        .authorization_bearer(&admin)
        .json(&json!({"user_id": buyer_id, "property_id": property["id"]}))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .delete(&format!("/api/admin/users/{}", buyer_id))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(&format!("/api/admin/properties/{}", property["id"]))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["data"]["status"], "available");
    let response = app.server.get("/api/admin/purchases").authorization_bearer(&admin).await;
    assert!(response.json::<Value>()["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = setup().await;
    let forged = TokenService::new("change-me-in-production", 7)
        .issue(1, SessionKind::Admin, "super_admin")
        .unwrap();

    let response = app
        .server
        .get("/api/admin/users")
        .authorization_bearer(&forged)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wishlist() {
    let app = setup().await;
    let admin = admin_token(&app).await;
    let (_, user) = register(&app, "Gbenga", "gbenga@example.com").await;
    let property = create_property(&app, &admin, "Bungalow by the Lagoon").await;
    let path = format!("/api/wishlist/{}", property["id"]);

    app.server.post(&path).authorization_bearer(&user).await.assert_status_ok();
    app.server.post(&path).authorization_bearer(&user).await.assert_status_ok();

    let response = app.server.get("/api/wishlist").authorization_bearer(&user).await;
    let items = response.json::<Value>()["data"].clone();
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["id"], property["id"]);

    app.server.delete(&path).authorization_bearer(&user).await.assert_status_ok();
    app.server.delete(&path).authorization_bearer(&user).await.assert_status_ok();

    app.server
        .post("/api/wishlist/99999")
        .authorization_bearer(&user)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_flow() {
    let app = setup().await;
    let admin = admin_token(&app).await;

    let response = app
        .server
        .post("/api/admin/blog-categories")
        .authorization_bearer(&admin)
        .json(&json!({"name": "Market News"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let category = response.json::<Value>()["data"].clone();
    assert_eq!(category["slug"], "market-news");

    let response = app
        .server
        .post("/api/admin/blogs")
        .authorization_bearer(&admin)
        .json(&json!({
            "title": "Buying Land in Lagos",
            "content": "# Checklist\n\nVerify the **survey** first.",
            "category_id": category["id"],
            "tags": ["land", "guides"],
            "status": "published"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let post = response.json::<Value>()["data"].clone();
    assert!(post["content_html"].as_str().unwrap().contains("<strong>survey</strong>"));

    app.server
        .post("/api/admin/blogs")
        .authorization_bearer(&admin)
        .json(&json!({"title": "Draft Thoughts", "content": "later"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.server.get("/api/blogs").await;
    assert_eq!(response.json::<Value>()["data"]["total"], 1);

    let response = app
        .server
        .get("/api/blogs")
        .add_query_param("category", "market-news")
        .await;
    assert_eq!(response.json::<Value>()["data"]["total"], 1);

    app.server
        .get("/api/blogs/buying-land-in-lagos")
        .await
        .assert_status_ok();
    app.server
        .get("/api/blogs/draft-thoughts")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = app.server.get("/api/blog-categories").await;
    let categories = response.json::<Value>()["data"].clone();
    assert_eq!(categories[0]["post_count"], 1);
}

#[tokio::test]
async fn test_inquiries_and_newsletter() {
    let app = setup().await;
    let admin = admin_token(&app).await;

    let response = app
        .server
        .post("/api/inquiries")
        .json(&json!({
            "name": "Halima",
            "email": "halima@example.com",
            "message": "Is the duplex still available?"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let inquiry_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();

    app.server
        .post("/api/inquiries")
        .json(&json!({
            "name": "Halima",
            "email": "halima@example.com",
            "message": "Hello",
            "property_id": 4242
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .put(&format!("/api/admin/inquiries/{}", inquiry_id))
        .authorization_bearer(&admin)
        .json(&json!({"status": "contacted"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "contacted");

    for _ in 0..2 {
        app.server
            .post("/api/newsletter/subscribe")
            .json(&json!({"email": "reader@example.com"}))
            .await
            .assert_status_ok();
    }
    app.server
        .post("/api/newsletter/unsubscribe")
        .json(&json!({"email": "nobody@example.com"}))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/api/admin/newsletter")
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["data"]["total"], 1);

    let response = app
        .server
        .get("/api/admin/stats")
        .authorization_bearer(&admin)
        .await;
    let stats = response.json::<Value>()["data"].clone();
    assert_eq!(stats["active_subscribers"], 1);
    assert_eq!(stats["new_inquiries"], 0);
}

#[tokio::test]
async fn test_password_reset() {
    let app = setup().await;
    register(&app, "Ife", "ife@example.com").await;

    // Unknown address gets the same answer
    for email in ["ife@example.com", "ghost@example.com"] {
        app.server
            .post("/api/auth/forgot-password")
            .json(&json!({"email": email}))
            .await
            .assert_status_ok();
    }

    let token = app
        .state
        .user_service
        .request_password_reset("ife@example.com")
        .await
        .unwrap()
        .unwrap();

    app.server
        .post("/api/auth/reset-password")
        .json(&json!({"token": token, "password": "new-password-1"}))
        .await
        .assert_status_ok();

    // Tokens are single use
    app.server
        .post("/api/auth/reset-password")
        .json(&json!({"token": token, "password": "new-password-2"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/auth/login")
        .json(&json!({"email": "ife@example.com", "password": "new-password-1"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_uploads() {
    let app = setup().await;
    let admin = admin_token(&app).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
            .file_name("house.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/admin/uploads/image")
        .add_query_param("folder", "properties")
        .authorization_bearer(&admin)
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let uploaded = response.json::<Value>()["data"].clone();
    let url = uploaded["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/properties/"));
    assert!(url.ends_with(".png"));

    // Served back from local storage, never as active content
    let response = app.server.get(&url).await;
    response.assert_status_ok();
    assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
    assert!(response
        .header(header::CONTENT_SECURITY_POLICY)
        .to_str()
        .unwrap()
        .contains("sandbox"));

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"#!/bin/sh".to_vec())
            .file_name("run.sh")
            .mime_type("application/x-sh"),
    );
    app.server
        .post("/api/admin/uploads/image")
        .authorization_bearer(&admin)
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 2048])
            .file_name("big.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/admin/uploads/image")
        .authorization_bearer(&admin)
        .multipart(form)
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["code"], "PAYLOAD_TOO_LARGE");

    // Partial failures are reported per file
    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"gif89a".to_vec()).file_name("a.gif").mime_type("image/gif"),
        )
        .add_part(
            "files",
            Part::bytes(b"text".to_vec()).file_name("b.txt").mime_type("text/plain"),
        );
    let response = app
        .server
        .post("/api/admin/uploads/images")
        .authorization_bearer(&admin)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>()["data"].clone();
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["failed"].as_array().unwrap().len(), 1);
    assert!(body["failed"][0].as_str().unwrap().starts_with("b.txt"));

    // Customers upload only their own avatar
    let (_, user) = register(&app, "Jide", "jide@example.com").await;
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"RIFFwebp".to_vec()).file_name("me.webp").mime_type("image/webp"),
    );
    let response = app
        .server
        .post("/api/auth/avatar")
        .authorization_bearer(&user)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let avatar = response.json::<Value>()["data"]["avatar"].as_str().unwrap().to_string();
    assert!(avatar.starts_with("/uploads/avatars/"));
    app.server.get(&avatar).await.assert_status_ok();

    // Replacing the avatar removes the old file
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\x89PNG\r\n\x1a\nme".to_vec())
            .file_name("me.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/auth/avatar")
        .authorization_bearer(&user)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let replaced = response.json::<Value>()["data"]["avatar"].as_str().unwrap().to_string();
    assert_ne!(replaced, avatar);
    app.server.get(&replaced).await.assert_status_ok();
    app.server.get(&avatar).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_svg_avatar_rejected() {
    let app = setup().await;
    let (_, user) = register(&app, "Ngozi", "ngozi@example.com").await;

    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(svg.to_vec()).file_name("me.svg").mime_type("image/svg+xml"),
    );
    let response = app
        .server
        .post("/api/auth/avatar")
        .authorization_bearer(&user)
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

    let response = app.server.get("/api/auth/me").authorization_bearer(&user).await;
    assert!(response.json::<Value>()["data"]["avatar"].is_null());
}
