//! Damage report endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResponse, AppJson, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        transaction::{CreateDamageReport, DamageReport, DamageReportQuery},
        Permission,
    },
};

/// List damage reports, newest first
#[utoipa::path(
    get,
    path = "/damage-reports",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(DamageReportQuery),
    responses(
        (status = 200, description = "List of damage reports", body = PaginatedResponse<DamageReport>)
    )
)]
pub async fn list_damage_reports(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<DamageReportQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<DamageReport>>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state
        .services
        .transactions
        .list_damage_reports(&query, per_page, offset)
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/damage-reports/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Damage report ID")),
    responses(
        (status = 200, description = "Damage report", body = DamageReport),
        (status = 404, description = "Damage report not found")
    )
)]
pub async fn get_damage_report(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<DamageReport>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let report = state.services.transactions.get_damage_report(id).await?;
    Ok(ApiResponse::ok(report))
}

/// File a damage report against a returned item
#[utoipa::path(
    post,
    path = "/damage-reports",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = CreateDamageReport,
    responses(
        (status = 200, description = "Damage report filed", body = DamageReport),
        (status = 400, description = "Invalid input, unknown return item or inactive employee")
    )
)]
pub async fn create_damage_report(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateDamageReport>,
) -> AppResult<Json<ApiResponse<DamageReport>>> {
    ctx.require(Permission::ReportDamage)?;

    let report = state.services.transactions.create_damage_report(&ctx, data).await?;
    Ok(ApiResponse::with_message(report, "Damage report filed"))
}
