//! OpenAPI document for the HTTP API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    ActivityResponse, AuthResponse, CreateFolderRequest, FileListResponse, FileResponse,
    FolderDetailResponse, FolderResponse, LoginRequest, MeResponse, MessageResponse,
    RegisterRequest, RenameFileRequest, RenameFolderRequest, TargetFolderRequest, UsageResponse,
    UserInfo, ValidateResponse,
};
use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "EUCLOUD API", description = "Personal cloud storage"),
    servers((url = "/api")),
    paths(
        handlers::register,
        handlers::login,
        handlers::logout,
        handlers::me,
        handlers::validate,
        handlers::upload_file,
        handlers::list_files,
        handlers::get_file,
        handlers::download_file,
        handlers::preview_file,
        handlers::rename_file,
        handlers::move_file,
        handlers::copy_file,
        handlers::delete_file,
        handlers::create_folder,
        handlers::list_folders,
        handlers::get_folder,
        handlers::rename_folder,
        handlers::move_folder,
        handlers::delete_folder,
        handlers::get_usage,
        handlers::get_activity,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RenameFileRequest,
            TargetFolderRequest,
            CreateFolderRequest,
            RenameFolderRequest,
            UserInfo,
            AuthResponse,
            MeResponse,
            ValidateResponse,
            MessageResponse,
            FileResponse,
            FolderResponse,
            FolderDetailResponse,
            FileListResponse,
            UsageResponse,
            ActivityResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and session"),
        (name = "files", description = "File upload, download and lifecycle"),
        (name = "folders", description = "Folder tree"),
        (name = "storage", description = "Quota and activity"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the handlers.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
