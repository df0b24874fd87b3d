//! Folder handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::FolderService;
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FolderDetailResponse, FolderResponse, MessageResponse,
    RenameFolderRequest, TargetFolderRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/folders/create - Create a folder.
#[utoipa::path(
    post,
    path = "/folders/create",
    tag = "folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Parent folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let folder = FolderService::new(&state.db)
        .create(&user, &req.name, req.parent_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FolderResponse::from(folder))),
    ))
}

/// GET /api/folders/list - Every folder the caller owns.
#[utoipa::path(
    get,
    path = "/folders/list",
    tag = "folders",
    responses(
        (status = 200, description = "Flat folder list", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let folders = FolderService::new(&state.db).list(&user).await?;
    Ok(Json(ApiResponse::new(
        folders.into_iter().map(FolderResponse::from).collect(),
    )))
}

/// GET /api/folders/:id - Folder details with breadcrumbs.
#[utoipa::path(
    get,
    path = "/folders/{id}",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder details", body = FolderDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FolderDetailResponse>>, ApiError> {
    let service = FolderService::new(&state.db);
    let folder = service.get(&user, id).await?;
    let path = service.path(&user, id).await?;

    Ok(Json(ApiResponse::new(FolderDetailResponse {
        folder: FolderResponse::from(folder),
        path: path.into_iter().map(FolderResponse::from).collect(),
    })))
}

/// PUT /api/folders/:id/rename - Rename a folder.
#[utoipa::path(
    put,
    path = "/folders/{id}/rename",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID")
    ),
    request_body = RenameFolderRequest,
    responses(
        (status = 200, description = "Renamed", body = FolderResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let folder = FolderService::new(&state.db)
        .rename(&user, id, &req.name)
        .await?;
    Ok(Json(ApiResponse::new(FolderResponse::from(folder))))
}

/// POST /api/folders/:id/move - Re-parent a folder (null = root).
#[utoipa::path(
    post,
    path = "/folders/{id}/move",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID")
    ),
    request_body = TargetFolderRequest,
    responses(
        (status = 200, description = "Moved", body = FolderResponse),
        (status = 400, description = "Move would create a cycle"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Option<Json<TargetFolderRequest>>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let target = body.map(|Json(b)| b).unwrap_or_default();
    let folder = FolderService::new(&state.db)
        .move_to(&user, id, target.folder_id)
        .await?;
    Ok(Json(ApiResponse::new(FolderResponse::from(folder))))
}

/// DELETE /api/folders/:id - Delete an empty folder.
#[utoipa::path(
    delete,
    path = "/folders/{id}",
    tag = "folders",
    params(
        ("id" = i64, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Folder is not empty"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    FolderService::new(&state.db).delete(&user, id).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new("Folder deleted"))))
}
