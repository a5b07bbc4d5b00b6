//! Borrow and return transaction endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResponse, AppJson, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        transaction::{BorrowingTransaction, BorrowingTransactionDetails, CreateTransaction, TransactionQuery},
        Permission,
    },
};

/// List transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(TransactionQuery),
    responses(
        (status = 200, description = "List of transactions", body = PaginatedResponse<BorrowingTransaction>)
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BorrowingTransaction>>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.transactions.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get a transaction with its returned items
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction details", body = BorrowingTransactionDetails),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BorrowingTransactionDetails>>> {
    ctx.require(Permission::ViewBorrowing)?;

    let details = state.services.transactions.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Record a borrow, return or partial return.
///
/// `borrow` needs an approved request and makes it active. `return` needs an
/// active or overdue request and completes it. `partial_return` only records
/// the returned lines.
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = CreateTransaction,
    responses(
        (status = 200, description = "Transaction recorded", body = BorrowingTransaction),
        (status = 400, description = "Invalid lines or request in the wrong state"),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn create_transaction(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateTransaction>,
) -> AppResult<Json<ApiResponse<BorrowingTransaction>>> {
    ctx.require(Permission::ProcessTransactions)?;

    let transaction = state.services.transactions.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(transaction, "Transaction recorded"))
}
