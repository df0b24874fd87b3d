//! Storage usage handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::file::UsageService;
use crate::web::dto::{ActivityQuery, ActivityResponse, ApiResponse, UsageResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/storage/usage - Quota summary.
#[utoipa::path(
    get,
    path = "/storage/usage",
    tag = "storage",
    responses(
        (status = 200, description = "Quota and object counts", body = UsageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<UsageResponse>>, ApiError> {
    let usage = UsageService::new(&state.db).usage(&user).await?;
    Ok(Json(ApiResponse::new(UsageResponse::from(usage))))
}

/// GET /api/storage/activity - Newest activity first.
#[utoipa::path(
    get,
    path = "/storage/activity",
    tag = "storage",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity feed", body = Vec<ActivityResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityResponse>>>, ApiError> {
    let entries = UsageService::new(&state.db)
        .recent_activity(&user, query.limit)
        .await?;
    Ok(Json(ApiResponse::new(
        entries.into_iter().map(ActivityResponse::from).collect(),
    )))
}
