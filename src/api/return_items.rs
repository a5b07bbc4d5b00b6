//! Return item endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResponse, AppJson, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        transaction::{CreateReturnItem, ReturnItem, ReturnItemQuery},
        Permission,
    },
};

#[utoipa::path(
    get,
    path = "/return-items",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(ReturnItemQuery),
    responses(
        (status = 200, description = "List of returned items", body = PaginatedResponse<ReturnItem>)
    )
)]
pub async fn list_return_items(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ReturnItemQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<ReturnItem>>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state
        .services
        .transactions
        .list_return_items(&query, per_page, offset)
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
    path = "/return-items/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Return item ID")),
    responses(
        (status = 200, description = "Returned item", body = ReturnItem),
        (status = 404, description = "Return item not found")
    )
)]
pub async fn get_return_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ReturnItem>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let item = state.services.transactions.get_return_item(id).await?;
    Ok(ApiResponse::ok(item))
}

/// Add a returned item to an existing return transaction
#[utoipa::path(
    post,
    path = "/return-items",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = CreateReturnItem,
    responses(
        (status = 200, description = "Return item recorded", body = ReturnItem),
        (status = 400, description = "Unknown transaction, foreign item or quantity above what is outstanding")
    )
)]
pub async fn create_return_item(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateReturnItem>,
) -> AppResult<Json<ApiResponse<ReturnItem>>> {
    ctx.require(Permission::ProcessTransactions)?;

    let item = state.services.transactions.create_return_item(&ctx, data).await?;
    Ok(ApiResponse::with_message(item, "Return item recorded"))
}
