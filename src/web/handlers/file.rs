//! File handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{upload_display_name, FileContent, FileService};
use crate::web::dto::{
    ApiResponse, FileListResponse, FileResponse, FolderResponse, ListQuery, RenameFileRequest,
    TargetFolderRequest, ValidatedJson,
};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

fn file_service(state: &AppState) -> FileService<'_> {
    FileService::new(&state.db, &state.blobs, &state.policy)
}

/// Build a Content-Disposition value that survives any display name.
///
/// Control characters (CR/LF included) are dropped so the name cannot
/// inject headers. Non-ASCII names get an RFC 5987 `filename*` parameter
/// next to a pure ASCII `filename` fallback with `_` for anything else.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let plain = filename.is_ascii()
        && !filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');
    if plain {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("{disposition}; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

fn content_response(content: FileContent, disposition: &str) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .header(header::CONTENT_TYPE, content.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &content.record.filename),
        )
        .header(header::CONTENT_LENGTH, content.bytes.len())
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(content.bytes))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(ErrorCode::PayloadTooLarge, "Upload exceeds the request size limit");
    }
    tracing::warn!("Failed to read multipart body: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

fn parse_folder_field(value: &str) -> Result<Option<i64>, ApiError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request("folder_id must be an integer"))
}

/// POST /api/files/upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" part and an optional
/// "folder_id" part.
#[utoipa::path(
    post,
    path = "/files/upload",
    tag = "files",
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 400, description = "No file, bad name or disallowed extension"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Target folder not found"),
        (status = 413, description = "File too large or quota exceeded")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut folder_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| upload_display_name(s).to_string());
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "folder_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                folder_id = parse_folder_field(&text)?;
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = filename
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No file selected"))?;

    let record = file_service(&state)
        .upload(&user, &filename, &content, folder_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(record))),
    ))
}

/// GET /api/files/list - List one folder level (root by default).
#[utoipa::path(
    get,
    path = "/files/list",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "Files and sub-folders", body = FileListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<FileListResponse>>, ApiError> {
    let listing = file_service(&state).list(&user, query.folder_id).await?;

    Ok(Json(ApiResponse::new(FileListResponse {
        files: listing.files.into_iter().map(FileResponse::from).collect(),
        folders: listing.folders.into_iter().map(FolderResponse::from).collect(),
    })))
}

/// GET /api/files/:id - File metadata.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = file_service(&state).get(&user, id).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(record))))
}

/// GET /api/files/:id/download - Download the original bytes.
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found, or missing on disk")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let content = file_service(&state).download(&user, id).await?;
    content_response(content, "attachment")
}

/// GET /api/files/:id/preview - Thumbnail, or the original if there is none.
#[utoipa::path(
    get,
    path = "/files/{id}/preview",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Preview content"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found, or missing on disk")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let content = file_service(&state).preview(&user, id).await?;
    content_response(content, "inline")
}

/// PUT /api/files/:id/rename - Change the display name.
#[utoipa::path(
    put,
    path = "/files/{id}/rename",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = RenameFileRequest,
    responses(
        (status = 200, description = "Renamed", body = FileResponse),
        (status = 400, description = "Invalid name or disallowed extension"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = file_service(&state)
        .rename(&user, id, req.filename.trim())
        .await?;
    Ok(Json(ApiResponse::new(FileResponse::from(record))))
}

/// POST /api/files/:id/move - Move to another folder (null = root).
#[utoipa::path(
    post,
    path = "/files/{id}/move",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = TargetFolderRequest,
    responses(
        (status = 200, description = "Moved", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Option<Json<TargetFolderRequest>>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let target = body.map(|Json(b)| b).unwrap_or_default();
    let record = file_service(&state)
        .move_to(&user, id, target.folder_id)
        .await?;
    Ok(Json(ApiResponse::new(FileResponse::from(record))))
}

/// POST /api/files/:id/copy - Duplicate a file (charges the quota).
#[utoipa::path(
    post,
    path = "/files/{id}/copy",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    request_body = TargetFolderRequest,
    responses(
        (status = 201, description = "Copied", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or folder not found, or source missing on disk"),
        (status = 413, description = "Quota exceeded")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn copy_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Option<Json<TargetFolderRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let target = body.map(|Json(b)| b).unwrap_or_default();
    let record = file_service(&state)
        .copy(&user, id, target.folder_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(record))),
    ))
}

/// DELETE /api/files/:id - Move a file to the trash.
///
/// The blob is kept and the quota is not refunded.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Trashed", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let record = file_service(&state).soft_delete(&user, id).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(record))))
}
