//! Activity log endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use super::{ApiResponse, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        activity::{ActivityLog, ActivityQuery},
        Permission,
    },
};

/// List activity log entries, newest first
#[utoipa::path(
    get,
    path = "/activity-logs",
    tag = "activity",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity log entries", body = PaginatedResponse<ActivityLog>),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_activity(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<ActivityLog>>>> {
    ctx.require(Permission::ViewActivity)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.activity.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}
