//! Test helpers for HTTP API tests.
//!
//! Builds a TestServer over an in-memory database and a temporary blob root.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use eucloud::config::Config;
use eucloud::web::{create_router, AppState};
use eucloud::Database;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "password123";

/// A running test server and the resources behind it.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub config: Config,
    // Keeps the blob directories alive for the test's duration.
    pub temp_dir: TempDir,
}

/// Create a test configuration rooted in `temp_dir`.
pub fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.auth.token_expiry_secs = 900;
    config.storage.upload_path = temp_dir.path().join("uploads").display().to_string();
    config.storage.thumbnail_path = temp_dir.path().join("thumbnails").display().to_string();
    config.storage.max_upload_size_mb = 1;
    config
}

/// Create a test server with default settings.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Create a test server after adjusting the config.
pub async fn create_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&temp_dir);
    adjust(&mut config);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let app_state =
        Arc::new(AppState::new(&config, db.clone()).expect("Failed to create app state"));
    let router = create_router(app_state, &config.server.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        config,
        temp_dir,
    }
}

/// Register a user and return the response body.
pub async fn register_test_user(server: &TestServer, email: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Register a user and return its access token.
pub async fn register_and_token(server: &TestServer, email: &str) -> String {
    get_access_token(&register_test_user(server, email).await)
}

/// Get access token from an auth response.
pub fn get_access_token(response: &Value) -> String {
    response["data"]["access_token"]
        .as_str()
        .expect("No access token")
        .to_string()
}

/// Get user ID from an auth response.
pub fn get_user_id(response: &Value) -> i64 {
    response["data"]["user"]["id"].as_i64().expect("No user id")
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Upload `content` as `filename`, optionally into a folder.
pub async fn upload_file(
    server: &TestServer,
    token: &str,
    filename: &str,
    content: Vec<u8>,
    folder_id: Option<i64>,
) -> TestResponse {
    let mut form =
        MultipartForm::new().add_part("file", Part::bytes(content).file_name(filename.to_string()));
    if let Some(folder_id) = folder_id {
        form = form.add_text("folder_id", folder_id.to_string());
    }

    server
        .post("/api/files/upload")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(form)
        .await
}

/// Create a folder and return its id.
pub async fn create_folder(
    server: &TestServer,
    token: &str,
    name: &str,
    parent_id: Option<i64>,
) -> i64 {
    let response = server
        .post("/api/folders/create")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({ "name": name, "parent_id": parent_id }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("No folder id")
}

/// A small PNG image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 144, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
