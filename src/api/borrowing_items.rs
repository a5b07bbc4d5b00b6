//! Borrowing item (request line) endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResponse, AppJson, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        borrowing::{BorrowingItem, BorrowingItemQuery, CreateBorrowingItem, UpdateBorrowingItem},
        transfer::{BulkDeleteRequest, BulkDeleteResult},
        Permission,
    },
};

/// List borrowing items
#[utoipa::path(
    get,
    path = "/borrowing-items",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(BorrowingItemQuery),
    responses(
        (status = 200, description = "List of borrowing items", body = PaginatedResponse<BorrowingItem>)
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<BorrowingItemQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BorrowingItem>>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.borrowing.list_items(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/borrowing-items/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing item ID")),
    responses(
        (status = 200, description = "Borrowing item", body = BorrowingItem),
        (status = 404, description = "Borrowing item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BorrowingItem>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let item = state.services.borrowing.get_item(id).await?;
    Ok(ApiResponse::ok(item))
}

/// Add an item to a pending request
#[utoipa::path(
    post,
    path = "/borrowing-items",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowingItem,
    responses(
        (status = 200, description = "Borrowing item created", body = BorrowingItem),
        (status = 400, description = "Invalid item or request is not pending"),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateBorrowingItem>,
) -> AppResult<Json<ApiResponse<BorrowingItem>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let item = state.services.borrowing.create_item(&ctx, data).await?;
    Ok(ApiResponse::with_message(item, "Borrowing item created"))
}

/// Update an item of a pending request
#[utoipa::path(
    put,
    path = "/borrowing-items/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing item ID")),
    request_body = UpdateBorrowingItem,
    responses(
        (status = 200, description = "Borrowing item updated", body = BorrowingItem),
        (status = 400, description = "Invalid input or request is not pending"),
        (status = 404, description = "Borrowing item not found")
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateBorrowingItem>,
) -> AppResult<Json<ApiResponse<BorrowingItem>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let item = state.services.borrowing.update_item(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(item, "Borrowing item updated"))
}

#[utoipa::path(
    delete,
    path = "/borrowing-items/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing item ID")),
    responses(
        (status = 200, description = "Borrowing item deleted", body = BulkDeleteResult),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Borrowing item not found")
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let deleted = state.services.borrowing.delete_items(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Borrowing item deleted"))
}

#[utoipa::path(
    post,
    path = "/borrowing-items/bulk-delete",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Borrowing items deleted", body = BulkDeleteResult),
        (status = 400, description = "One of the requests is not pending"),
        (status = 404, description = "One of the items does not exist")
    )
)]
pub async fn bulk_delete_items(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageBorrowing)?;

    let deleted = state.services.borrowing.delete_items(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} borrowing items deleted", deleted),
    ))
}
