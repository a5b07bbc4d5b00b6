//! Borrow/return transactions, returned items and damage reports

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::borrowing::{BorrowingItem, LifecycleEvent};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Borrow,
    Return,
    PartialReturn,
}

impl TransactionType {
    pub fn event(self) -> LifecycleEvent {
        match self {
            TransactionType::Borrow => LifecycleEvent::Borrow,
            TransactionType::Return => LifecycleEvent::Return,
            TransactionType::PartialReturn => LifecycleEvent::PartialReturn,
        }
    }

    pub fn is_return(self) -> bool {
        matches!(self, TransactionType::Return | TransactionType::PartialReturn)
    }
}

/// Condition of an item when it came back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "item_condition", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    #[default]
    Good,
    Fair,
    Damaged,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingTransaction {
    pub id: i32,
    pub borrowing_request_id: i32,
    pub transaction_type: TransactionType,
    pub processed_by: i32,
    pub transaction_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingTransactionDetails {
    #[serde(flatten)]
    pub transaction: BorrowingTransaction,
    pub processed_by_name: String,
    pub return_items: Vec<ReturnItem>,
}

/// One line of a borrow or return transaction
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionLine {
    pub borrowing_item_id: i32,
    /// Borrowed quantity for `borrow`, returned quantity otherwise
    pub quantity: i32,
    #[serde(default)]
    pub condition_status: Option<ItemCondition>,
    pub damage_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTransaction {
    pub borrowing_request_id: i32,
    pub transaction_type: TransactionType,
    /// Employee handling the hand-over
    pub processed_by: i32,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<TransactionLine>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TransactionQuery {
    pub borrowing_request_id: Option<i32>,
    pub transaction_type: Option<TransactionType>,
    pub processed_by: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Planned `quantity_borrowed` for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowPlan {
    pub borrowing_item_id: i32,
    pub quantity: i32,
}

/// Planned return item row
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPlan {
    pub borrowing_item_id: i32,
    pub quantity_returned: i32,
    pub condition_status: ItemCondition,
    pub damage_notes: Option<String>,
}

fn find_item(items: &[BorrowingItem], id: i32) -> AppResult<&BorrowingItem> {
    items.iter().find(|i| i.id == id).ok_or_else(|| {
        AppError::Validation(format!(
            "borrowing item {} does not belong to this request",
            id
        ))
    })
}

/// Quantities handed out by a `borrow` transaction.
///
/// Without explicit lines every item is borrowed at its approved quantity.
/// With lines, listed items get the given quantity (at most the approved
/// quantity) and the others are recorded as not borrowed.
pub fn plan_borrow(items: &[BorrowingItem], lines: &[TransactionLine]) -> AppResult<Vec<BorrowPlan>> {
    if lines.is_empty() {
        return Ok(items
            .iter()
            .map(|i| BorrowPlan {
                borrowing_item_id: i.id,
                quantity: i.default_borrow_quantity(),
            })
            .collect());
    }

    let mut given: HashMap<i32, i32> = HashMap::new();
    for line in lines {
        let item = find_item(items, line.borrowing_item_id)?;
        if line.quantity < 0 {
            return Err(AppError::Validation(format!(
                "borrowing item {}: quantity must not be negative",
                item.id
            )));
        }
        let approved = item.default_borrow_quantity();
        let total = given.entry(item.id).or_insert(0);
        *total = total
            .checked_add(line.quantity)
            .filter(|t| *t <= approved)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "borrowing item {}: cannot borrow more than the approved {}",
                    item.id, approved
                ))
            })?;
    }

    Ok(items
        .iter()
        .map(|i| BorrowPlan {
            borrowing_item_id: i.id,
            quantity: given.get(&i.id).copied().unwrap_or(0),
        })
        .collect())
}

/// Return item rows recorded by a `return` or `partial_return` transaction.
///
/// `returned` holds the quantity already returned per item. A partial return
/// needs at least one line. A full return without lines returns everything
/// still outstanding in good condition; with lines it must cover every
/// outstanding quantity exactly.
pub fn plan_return(
    items: &[BorrowingItem],
    returned: &HashMap<i32, i32>,
    lines: &[TransactionLine],
    full: bool,
) -> AppResult<Vec<ReturnPlan>> {
    let outstanding = |item: &BorrowingItem| {
        item.quantity_borrowed.unwrap_or(0) - returned.get(&item.id).copied().unwrap_or(0)
    };

    if lines.is_empty() {
        if !full {
            return Err(AppError::Validation(
                "partial_return requires at least one item line".to_string(),
            ));
        }
        return Ok(items
            .iter()
            .filter(|i| outstanding(i) > 0)
            .map(|i| ReturnPlan {
                borrowing_item_id: i.id,
                quantity_returned: outstanding(i),
                condition_status: ItemCondition::Good,
                damage_notes: None,
            })
            .collect());
    }

    let mut this_return: HashMap<i32, i32> = HashMap::new();
    let mut plans = Vec::with_capacity(lines.len());
    for line in lines {
        let item = find_item(items, line.borrowing_item_id)?;
        if line.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "borrowing item {}: quantity must be greater than zero",
                item.id
            )));
        }
        let left = outstanding(item);
        let total = this_return.entry(item.id).or_insert(0);
        *total = total
            .checked_add(line.quantity)
            .filter(|t| *t <= left)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "borrowing item {}: returning more than the {} outstanding",
                    item.id, left
                ))
            })?;
        plans.push(ReturnPlan {
            borrowing_item_id: item.id,
            quantity_returned: line.quantity,
            condition_status: line.condition_status.unwrap_or_default(),
            damage_notes: line.damage_notes.clone(),
        });
    }

    if full {
        if let Some(item) = items
            .iter()
            .find(|i| outstanding(i) != this_return.get(&i.id).copied().unwrap_or(0))
        {
            return Err(AppError::Validation(format!(
                "borrowing item {} still has outstanding quantity; use partial_return",
                item.id
            )));
        }
    }

    Ok(plans)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnItem {
    pub id: i32,
    pub borrowing_transaction_id: i32,
    pub borrowing_item_id: i32,
    pub quantity_returned: i32,
    pub condition_status: ItemCondition,
    pub damage_notes: Option<String>,
    pub return_date: DateTime<Utc>,
}

/// Record an additional returned item on an existing return transaction
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReturnItem {
    pub borrowing_transaction_id: i32,
    pub borrowing_item_id: i32,
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub quantity_returned: i32,
    pub condition_status: Option<ItemCondition>,
    pub damage_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReturnItemQuery {
    pub borrowing_transaction_id: Option<i32>,
    pub borrowing_item_id: Option<i32>,
    pub borrowing_request_id: Option<i32>,
    pub condition_status: Option<ItemCondition>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DamageReport {
    pub id: i32,
    pub return_item_id: i32,
    pub damage_type: String,
    pub damage_description: Option<String>,
    pub repair_cost: Option<Decimal>,
    pub replacement_cost: Option<Decimal>,
    pub reported_by: i32,
    pub report_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDamageReport {
    pub return_item_id: i32,
    #[validate(length(min = 1, max = 128, message = "is required"))]
    pub damage_type: String,
    pub damage_description: Option<String>,
    pub repair_cost: Option<Decimal>,
    pub replacement_cost: Option<Decimal>,
    /// Employee filing the report
    pub reported_by: i32,
}

impl CreateDamageReport {
    pub fn check_costs(&self) -> AppResult<()> {
        for (field, value) in [
            ("repair_cost", self.repair_cost),
            ("replacement_cost", self.replacement_cost),
        ] {
            if value.is_some_and(|v| v.is_sign_negative()) {
                return Err(AppError::Validation(format!("{}: must not be negative", field)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DamageReportQuery {
    pub return_item_id: Option<i32>,
    pub borrowing_request_id: Option<i32>,
    pub reported_by: Option<i32>,
    pub damage_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i32, requested: i32, approved: Option<i32>, borrowed: Option<i32>) -> BorrowingItem {
        BorrowingItem {
            id,
            borrowing_request_id: 1,
            item_type_id: None,
            material_id: None,
            item_description: format!("item {}", id),
            quantity_requested: requested,
            quantity_approved: approved,
            quantity_borrowed: borrowed,
            estimated_value: None,
        }
    }

    fn line(id: i32, quantity: i32) -> TransactionLine {
        TransactionLine {
            borrowing_item_id: id,
            quantity,
            condition_status: None,
            damage_notes: None,
        }
    }

    #[test]
    fn test_borrow_defaults_to_approved_quantity() {
        let items = vec![item(1, 5, Some(3), None), item(2, 2, None, None)];
        let plan = plan_borrow(&items, &[]).unwrap();
        assert_eq!(
            plan,
            vec![
                BorrowPlan { borrowing_item_id: 1, quantity: 3 },
                BorrowPlan { borrowing_item_id: 2, quantity: 2 },
            ]
        );
    }

    #[test]
    fn test_borrow_lines_capped_by_approval() {
        let items = vec![item(1, 5, Some(3), None), item(2, 2, None, None)];
        let plan = plan_borrow(&items, &[line(1, 2)]).unwrap();
        assert_eq!(plan[0].quantity, 2);
        assert_eq!(plan[1].quantity, 0);

        assert!(plan_borrow(&items, &[line(1, 4)]).is_err());
        assert!(plan_borrow(&items, &[line(1, 2), line(1, 2)]).is_err());
        assert!(plan_borrow(&items, &[line(99, 1)]).is_err());
    }

    #[test]
    fn test_line_quantities_that_overflow_are_rejected() {
        let items = vec![item(1, 5, Some(5), Some(5))];

        let err = plan_borrow(&items, &[line(1, 5), line(1, i32::MAX)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = plan_return(&items, &HashMap::new(), &[line(1, 5), line(1, i32::MAX)], false)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = plan_return(&items, &HashMap::new(), &[line(1, i32::MAX), line(1, i32::MAX)], false)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_full_return_without_lines_returns_outstanding() {
        let items = vec![item(1, 5, Some(3), Some(3)), item(2, 2, None, Some(2))];
        let returned = HashMap::from([(1, 1), (2, 2)]);
        let plan = plan_return(&items, &returned, &[], true).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].borrowing_item_id, 1);
        assert_eq!(plan[0].quantity_returned, 2);
        assert_eq!(plan[0].condition_status, ItemCondition::Good);
    }

    #[test]
    fn test_partial_return_needs_lines() {
        let items = vec![item(1, 5, Some(3), Some(3))];
        assert!(plan_return(&items, &HashMap::new(), &[], false).is_err());
    }

    #[test]
    fn test_return_cannot_exceed_outstanding() {
        let items = vec![item(1, 5, Some(3), Some(3))];
        let returned = HashMap::from([(1, 2)]);
        assert!(plan_return(&items, &returned, &[line(1, 2)], false).is_err());
        let plan = plan_return(&items, &returned, &[line(1, 1)], false).unwrap();
        assert_eq!(plan[0].quantity_returned, 1);
    }

    #[test]
    fn test_full_return_with_lines_must_cover_everything() {
        let items = vec![item(1, 5, Some(3), Some(3)), item(2, 2, None, Some(2))];
        assert!(plan_return(&items, &HashMap::new(), &[line(1, 3)], true).is_err());

        let mut damaged = line(2, 2);
        damaged.condition_status = Some(ItemCondition::Damaged);
        damaged.damage_notes = Some("cracked handle".into());
        let plan = plan_return(&items, &HashMap::new(), &[line(1, 3), damaged], true).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].condition_status, ItemCondition::Damaged);
    }

    #[test]
    fn test_transaction_type_events() {
        assert_eq!(TransactionType::Borrow.event(), LifecycleEvent::Borrow);
        assert!(TransactionType::PartialReturn.is_return());
        assert!(!TransactionType::Borrow.is_return());
        let t: TransactionType = serde_json::from_str("\"partial_return\"").unwrap();
        assert_eq!(t, TransactionType::PartialReturn);
    }

    #[test]
    fn test_damage_costs_must_be_positive() {
        let report = CreateDamageReport {
            return_item_id: 1,
            damage_type: "scratch".into(),
            damage_description: None,
            repair_cost: Some(Decimal::new(-500, 2)),
            replacement_cost: None,
            reported_by: 1,
        };
        assert!(report.check_costs().is_err());
    }
}
