//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    copy_file, create_folder, delete_file, delete_folder, download_file, get_activity, get_file,
    get_folder, get_usage, list_files, list_folders, login, logout, me, move_file, move_folder,
    preview_file, register, rename_file, rename_folder, upload_file, validate, AppState,
};
use super::middleware::create_cors_layer;
use super::openapi::ApiDoc;

/// Room for multipart boundaries and the non-file form fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Create the main API router, health check and API docs included.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = app_state
        .policy
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/validate", get(validate));

    let file_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/list", get(list_files))
        .route("/:id", get(get_file).delete(delete_file))
        .route("/:id/download", get(download_file))
        .route("/:id/preview", get(preview_file))
        .route("/:id/rename", put(rename_file))
        .route("/:id/move", post(move_file))
        .route("/:id/copy", post(copy_file));

    let folder_routes = Router::new()
        .route("/create", post(create_folder))
        .route("/list", get(list_folders))
        .route("/:id", get(get_folder).delete(delete_folder))
        .route("/:id/rename", put(rename_folder))
        .route("/:id/move", post(move_folder));

    let storage_routes = Router::new()
        .route("/usage", get(get_usage))
        .route("/activity", get(get_activity));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/folders", folder_routes)
        .nest("/storage", storage_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
