//! Borrowing requests and their line items

use chrono::Utc;
use serde_json::json;

use super::{activity::ActivityService, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{
            ApproveBorrowingRequest, BorrowingItem, BorrowingItemQuery, BorrowingRequest,
            BorrowingRequestDetails, BorrowingRequestQuery, BorrowingRequestSummary,
            CreateBorrowingItem, CreateBorrowingRequest, NewBorrowingItem, OverdueSweep,
            RejectBorrowingRequest, UpdateBorrowingItem, UpdateBorrowingRequest,
        },
        AuthContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingService {
    repository: Repository,
    activity: ActivityService,
}

impl BorrowingService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &BorrowingRequestQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingRequestSummary>, i64)> {
        self.repository.borrowing_list(query, per_page, offset).await
    }

    /// Request with its items and transactions
    pub async fn get(&self, id: i32) -> AppResult<BorrowingRequestDetails> {
        self.repository.borrowing_get(id).await
    }

    /// Create a pending request together with its items. Nothing is stored
    /// unless every item is valid.
    pub async fn create(
        &self,
        actor: &AuthContext,
        data: CreateBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let new_request = data.validate_new()?;
        let request = self.repository.borrowing_create(&new_request).await?;

        tracing::info!(
            request_id = request.id,
            customer_id = request.customer_id,
            items = new_request.items.len(),
            "Borrowing request created"
        );
        self.activity
            .record(
                actor,
                "create",
                "borrowing_request",
                Some(request.id),
                Some(json!({
                    "customer_id": request.customer_id,
                    "items": new_request.items.len(),
                })),
            )
            .await;
        Ok(request)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let request = self.repository.borrowing_update(id, &data).await?;
        self.activity
            .record(actor, "update", "borrowing_request", Some(id), None)
            .await;
        Ok(request)
    }

    pub async fn approve(
        &self,
        actor: &AuthContext,
        id: i32,
        data: ApproveBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let request = self
            .repository
            .borrowing_approve(id, actor.admin_id, &data)
            .await?;
        tracing::info!(request_id = id, admin_id = actor.admin_id, "Borrowing request approved");
        self.activity
            .record(
                actor,
                "approve",
                "borrowing_request",
                Some(id),
                (!data.items.is_empty()).then(|| json!({ "overrides": data.items.len() })),
            )
            .await;
        Ok(request)
    }

    pub async fn reject(
        &self,
        actor: &AuthContext,
        id: i32,
        data: RejectBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let reason = data.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let request = self
            .repository
            .borrowing_reject(id, actor.admin_id, reason)
            .await?;
        tracing::info!(request_id = id, admin_id = actor.admin_id, "Borrowing request rejected");
        self.activity
            .record(
                actor,
                "reject",
                "borrowing_request",
                Some(id),
                reason.map(|r| json!({ "reason": r })),
            )
            .await;
        Ok(request)
    }

    /// Delete requests and their items, transactions, returns and damage
    /// reports, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self.repository.borrowing_delete(&ids).await?;
        self.activity
            .record(actor, "delete", "borrowing_request", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<BorrowingRequestSummary>> {
        self.repository.borrowing_all().await
    }

    /// Flag active requests past their expected return date
    pub async fn mark_overdue(&self, actor: &AuthContext) -> AppResult<OverdueSweep> {
        let marked = self.repository.borrowing_mark_overdue().await?;
        if !marked.is_empty() {
            tracing::info!(count = marked.len(), "Marked borrowing requests overdue");
            self.activity
                .record(actor, "mark_overdue", "borrowing_request", sole_id(&marked), Some(json!({ "ids": marked })))
                .await;
        }
        Ok(OverdueSweep {
            marked,
            as_of: Utc::now().date_naive(),
        })
    }

    pub async fn list_items(
        &self,
        query: &BorrowingItemQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingItem>, i64)> {
        self.repository.borrowing_items_list(query, per_page, offset).await
    }

    pub async fn get_item(&self, id: i32) -> AppResult<BorrowingItem> {
        self.repository.borrowing_items_get(id).await
    }

    /// Add an item to a pending request
    pub async fn create_item(
        &self,
        actor: &AuthContext,
        data: CreateBorrowingItem,
    ) -> AppResult<BorrowingItem> {
        let item = NewBorrowingItem::from_input(&data.item, 1)?;
        let row = self
            .repository
            .borrowing_items_create(data.borrowing_request_id, &item)
            .await?;
        self.activity
            .record(
                actor,
                "create",
                "borrowing_item",
                Some(row.id),
                Some(json!({ "borrowing_request_id": row.borrowing_request_id })),
            )
            .await;
        Ok(row)
    }

    /// Update an item of a pending request
    pub async fn update_item(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateBorrowingItem,
    ) -> AppResult<BorrowingItem> {
        validate_item_update(&data)?;
        let row = self.repository.borrowing_items_update(id, &data).await?;
        self.activity
            .record(
                actor,
                "update",
                "borrowing_item",
                Some(id),
                Some(json!({ "borrowing_request_id": row.borrowing_request_id })),
            )
            .await;
        Ok(row)
    }

    /// Remove items from pending requests, all or nothing
    pub async fn delete_items(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self.repository.borrowing_items_delete(&ids).await?;
        self.activity
            .record(actor, "delete", "borrowing_item", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }
}

fn validate_item_update(data: &UpdateBorrowingItem) -> AppResult<()> {
    if data
        .item_description
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        return Err(AppError::Validation("item_description must not be empty".to_string()));
    }
    if data.quantity_requested.is_some_and(|q| q <= 0) {
        return Err(AppError::Validation(
            "quantity_requested must be greater than zero".to_string(),
        ));
    }
    if data.estimated_value.is_some_and(|v| v.is_sign_negative()) {
        return Err(AppError::Validation("estimated_value must not be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_item_update_rules() {
        assert!(validate_item_update(&UpdateBorrowingItem::default()).is_ok());

        let blank = UpdateBorrowingItem {
            item_description: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_item_update(&blank), Err(AppError::Validation(_))));

        let zero = UpdateBorrowingItem {
            quantity_requested: Some(0),
            ..Default::default()
        };
        assert!(validate_item_update(&zero).is_err());

        let negative = UpdateBorrowingItem {
            estimated_value: Some(Decimal::new(-100, 2)),
            ..Default::default()
        };
        assert!(validate_item_update(&negative).is_err());

        let fine = UpdateBorrowingItem {
            item_description: Some("Ladder".to_string()),
            quantity_requested: Some(3),
            ..Default::default()
        };
        assert!(validate_item_update(&fine).is_ok());
    }
}
