//! Borrow/return transactions, return items and damage reports

use serde_json::json;
use validator::Validate;

use super::activity::ActivityService;
use crate::{
    error::AppResult,
    models::{
        transaction::{
            BorrowingTransaction, BorrowingTransactionDetails, CreateDamageReport, CreateReturnItem,
            CreateTransaction, DamageReport, DamageReportQuery, ReturnItem, ReturnItemQuery,
            TransactionQuery,
        },
        AuthContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
    activity: ActivityService,
}

impl TransactionsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &TransactionQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingTransaction>, i64)> {
        self.repository.transactions_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<BorrowingTransactionDetails> {
        self.repository.transactions_get(id).await
    }

    /// Record a borrow, return or partial return and apply the resulting
    /// status change to the request
    pub async fn create(
        &self,
        actor: &AuthContext,
        data: CreateTransaction,
    ) -> AppResult<BorrowingTransaction> {
        let transaction = self.repository.transactions_create(&data).await?;

        tracing::info!(
            transaction_id = transaction.id,
            request_id = transaction.borrowing_request_id,
            kind = ?transaction.transaction_type,
            "Borrowing transaction recorded"
        );
        self.activity
            .record(
                actor,
                "create",
                "borrowing_transaction",
                Some(transaction.id),
                Some(json!({
                    "borrowing_request_id": transaction.borrowing_request_id,
                    "transaction_type": transaction.transaction_type,
                    "lines": data.items.len(),
                })),
            )
            .await;
        Ok(transaction)
    }

    pub async fn list_return_items(
        &self,
        query: &ReturnItemQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ReturnItem>, i64)> {
        self.repository.return_items_list(query, per_page, offset).await
    }

    pub async fn get_return_item(&self, id: i32) -> AppResult<ReturnItem> {
        self.repository.return_items_get(id).await
    }

    /// Add a returned item to an existing return transaction
    pub async fn create_return_item(
        &self,
        actor: &AuthContext,
        data: CreateReturnItem,
    ) -> AppResult<ReturnItem> {
        data.validate()?;
        let item = self.repository.return_items_create(&data).await?;
        self.activity
            .record(
                actor,
                "create",
                "return_item",
                Some(item.id),
                Some(json!({
                    "borrowing_transaction_id": item.borrowing_transaction_id,
                    "quantity_returned": item.quantity_returned,
                    "condition_status": item.condition_status,
                })),
            )
            .await;
        Ok(item)
    }

    pub async fn list_damage_reports(
        &self,
        query: &DamageReportQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<DamageReport>, i64)> {
        self.repository.damage_reports_list(query, per_page, offset).await
    }

    pub async fn get_damage_report(&self, id: i32) -> AppResult<DamageReport> {
        self.repository.damage_reports_get(id).await
    }

    pub async fn create_damage_report(
        &self,
        actor: &AuthContext,
        data: CreateDamageReport,
    ) -> AppResult<DamageReport> {
        data.validate()?;
        data.check_costs()?;
        let report = self.repository.damage_reports_create(&data).await?;
        tracing::info!(
            damage_report_id = report.id,
            return_item_id = report.return_item_id,
            "Damage reported"
        );
        self.activity
            .record(
                actor,
                "create",
                "damage_report",
                Some(report.id),
                Some(json!({
                    "return_item_id": report.return_item_id,
                    "damage_type": report.damage_type,
                })),
            )
            .await;
        Ok(report)
    }
}
