//! Borrowing request endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};

use super::{export_response, ApiResponse, AppJson, CurrentAdmin, OptionalJson, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        borrowing::{
            ApproveBorrowingRequest, BorrowingRequest, BorrowingRequestDetails, BorrowingRequestQuery,
            BorrowingRequestSummary, CreateBorrowingRequest, OverdueSweep, RejectBorrowingRequest,
            UpdateBorrowingRequest,
        },
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery},
        Permission,
    },
};

/// List borrowing requests
#[utoipa::path(
    get,
    path = "/borrowing-requests",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(BorrowingRequestQuery),
    responses(
        (status = 200, description = "List of borrowing requests", body = PaginatedResponse<BorrowingRequestSummary>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<BorrowingRequestQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BorrowingRequestSummary>>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.borrowing.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get a request with its items and transactions
#[utoipa::path(
    get,
    path = "/borrowing-requests/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing request ID")),
    responses(
        (status = 200, description = "Borrowing request details", body = BorrowingRequestDetails),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BorrowingRequestDetails>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let details = state.services.borrowing.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a pending borrowing request with its items.
///
/// The request and every item are stored in one transaction; a single
/// invalid item rejects the whole request.
#[utoipa::path(
    post,
    path = "/borrowing-requests",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowingRequest,
    responses(
        (status = 200, description = "Borrowing request created", body = BorrowingRequest),
        (status = 400, description = "Missing field, invalid item or invalid reference")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateBorrowingRequest>,
) -> AppResult<Json<ApiResponse<BorrowingRequest>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let request = state.services.borrowing.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(request, "Borrowing request created"))
}

#[utoipa::path(
    put,
    path = "/borrowing-requests/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing request ID")),
    request_body = UpdateBorrowingRequest,
    responses(
        (status = 200, description = "Borrowing request updated", body = BorrowingRequest),
        (status = 400, description = "Request is closed or input is invalid"),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn update_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateBorrowingRequest>,
) -> AppResult<Json<ApiResponse<BorrowingRequest>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let request = state.services.borrowing.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(request, "Borrowing request updated"))
}

/// Delete a request together with its items, transactions and returns
#[utoipa::path(
    delete,
    path = "/borrowing-requests/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing request ID")),
    responses(
        (status = 200, description = "Borrowing request deleted", body = BulkDeleteResult),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn delete_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let deleted = state.services.borrowing.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Borrowing request deleted"))
}

#[utoipa::path(
    post,
    path = "/borrowing-requests/bulk-delete",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Borrowing requests deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the requests does not exist")
    )
)]
pub async fn bulk_delete_requests(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let deleted = state.services.borrowing.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} borrowing requests deleted", deleted),
    ))
}

/// Approve a pending request, optionally overriding approved quantities
#[utoipa::path(
    post,
    path = "/borrowing-requests/{id}/approve",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing request ID")),
    request_body = ApproveBorrowingRequest,
    responses(
        (status = 200, description = "Borrowing request approved", body = BorrowingRequest),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    OptionalJson(data): OptionalJson<ApproveBorrowingRequest>,
) -> AppResult<Json<ApiResponse<BorrowingRequest>>> {
    ctx.require(Permission::ApproveBorrowing)?;

    let request = state.services.borrowing.approve(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(request, "Borrowing request approved"))
}

/// Reject a pending request
#[utoipa::path(
    post,
    path = "/borrowing-requests/{id}/reject",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing request ID")),
    request_body = RejectBorrowingRequest,
    responses(
        (status = 200, description = "Borrowing request rejected", body = BorrowingRequest),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn reject_request(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    OptionalJson(data): OptionalJson<RejectBorrowingRequest>,
) -> AppResult<Json<ApiResponse<BorrowingRequest>>> {
    ctx.require(Permission::ApproveBorrowing)?;

    let request = state.services.borrowing.reject(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(request, "Borrowing request rejected"))
}

/// Mark active requests past their expected return date as overdue
#[utoipa::path(
    post,
    path = "/borrowing-requests/mark-overdue",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ids of the requests now overdue", body = OverdueSweep)
    )
)]
pub async fn mark_overdue(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
) -> AppResult<Json<ApiResponse<OverdueSweep>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let sweep = state.services.borrowing.mark_overdue(&ctx).await?;
    let message = format!("{} requests marked overdue", sweep.marked.len());
    Ok(ApiResponse::with_message(sweep, message))
}

#[utoipa::path(
    get,
    path = "/borrowing-requests/export",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv")
    )
)]
pub async fn export_requests(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewBorrowing)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.borrowing.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "borrowing_requests")
}
