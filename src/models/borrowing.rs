//! Borrowing requests, their line items and the request lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{
    enums::{SortDirection, SortKey},
    transaction::BorrowingTransaction,
};
use crate::error::{AppError, AppResult};

/// Lifecycle status of a borrowing request
///
/// ```text
/// pending ──approve──▶ approved ──borrow──▶ active ──return──▶ completed
///    │                                        │  ▲
///    └──reject──▶ rejected                    ▼  │ (return)
///                                           overdue
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "borrowing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Active,
    Completed,
    Overdue,
}

/// Something that happens to a request and may move its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Approve,
    Reject,
    Borrow,
    Return,
    PartialReturn,
    MarkOverdue,
}

impl LifecycleEvent {
    fn verb(self) -> &'static str {
        match self {
            LifecycleEvent::Approve => "approve",
            LifecycleEvent::Reject => "reject",
            LifecycleEvent::Borrow => "borrow against",
            LifecycleEvent::Return => "return",
            LifecycleEvent::PartialReturn => "partially return",
            LifecycleEvent::MarkOverdue => "mark overdue",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            LifecycleEvent::Approve | LifecycleEvent::Reject => "pending",
            LifecycleEvent::Borrow => "approved",
            LifecycleEvent::Return | LifecycleEvent::PartialReturn => "active or overdue",
            LifecycleEvent::MarkOverdue => "active",
        }
    }
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Pending => "pending",
            BorrowingStatus::Approved => "approved",
            BorrowingStatus::Rejected => "rejected",
            BorrowingStatus::Active => "active",
            BorrowingStatus::Completed => "completed",
            BorrowingStatus::Overdue => "overdue",
        }
    }

    /// No further transition or edit is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, BorrowingStatus::Rejected | BorrowingStatus::Completed)
    }

    /// Materials are out with the customer
    pub fn is_out(self) -> bool {
        matches!(self, BorrowingStatus::Active | BorrowingStatus::Overdue)
    }

    /// Status reached after `event`, or an `InvalidState` error naming the
    /// status the event requires.
    pub fn apply(self, event: LifecycleEvent) -> AppResult<BorrowingStatus> {
        use BorrowingStatus::*;
        use LifecycleEvent::*;

        let next = match (self, event) {
            (Pending, Approve) => Some(Approved),
            (Pending, Reject) => Some(Rejected),
            (Approved, Borrow) => Some(Active),
            (Active | Overdue, Return) => Some(Completed),
            (Active | Overdue, PartialReturn) => Some(self),
            (Active, MarkOverdue) => Some(Overdue),
            _ => None,
        };

        next.ok_or_else(|| {
            AppError::InvalidState(format!(
                "Cannot {} a request with status '{}'; the request must be {}",
                event.verb(),
                self,
                event.expected()
            ))
        })
    }
}

impl std::fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Borrowing request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingRequest {
    pub id: i32,
    pub customer_id: i32,
    pub employee_id: i32,
    pub location_id: i32,
    pub request_date: DateTime<Utc>,
    pub required_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub status: BorrowingStatus,
    pub approved_by: Option<i32>,
    pub approved_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request row joined with display names, used by list and export
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingRequestSummary {
    pub id: i32,
    pub customer_id: i32,
    pub customer_name: String,
    pub employee_id: i32,
    pub employee_name: String,
    pub location_id: i32,
    pub location_name: String,
    pub request_date: DateTime<Utc>,
    pub required_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub status: BorrowingStatus,
    pub approved_by: Option<i32>,
    pub approved_date: Option<DateTime<Utc>>,
    pub item_count: i64,
}

/// Full request view with items and transactions
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingRequestDetails {
    #[serde(flatten)]
    pub request: BorrowingRequest,
    pub customer_name: String,
    pub employee_name: String,
    pub location_name: String,
    pub approved_by_name: Option<String>,
    pub items: Vec<BorrowingItem>,
    pub transactions: Vec<BorrowingTransaction>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BorrowingRequestSort {
    #[default]
    RequestDate,
    RequiredDate,
    Status,
    CustomerName,
}

impl SortKey for BorrowingRequestSort {
    fn column(self) -> &'static str {
        match self {
            BorrowingRequestSort::RequestDate => "br.request_date",
            BorrowingRequestSort::RequiredDate => "br.required_date",
            BorrowingRequestSort::Status => "br.status",
            BorrowingRequestSort::CustomerName => "c.name",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingRequestQuery {
    /// Matches purpose, notes or customer name
    pub search: Option<String>,
    pub status: Option<BorrowingStatus>,
    pub customer_id: Option<i32>,
    pub employee_id: Option<i32>,
    pub location_id: Option<i32>,
    /// Earliest required date (inclusive)
    pub date_from: Option<NaiveDate>,
    /// Latest required date (inclusive)
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<BorrowingRequestSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Line item as submitted by a client; required fields are checked by
/// [`NewBorrowingItem::from_input`] so that a missing field reports its name.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BorrowingItemInput {
    pub item_type_id: Option<i32>,
    pub material_id: Option<i32>,
    pub item_description: Option<String>,
    pub quantity_requested: Option<i32>,
    pub estimated_value: Option<Decimal>,
}

/// Line item that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrowingItem {
    pub item_type_id: Option<i32>,
    pub material_id: Option<i32>,
    pub item_description: String,
    pub quantity_requested: i32,
    pub estimated_value: Option<Decimal>,
}

impl NewBorrowingItem {
    /// `position` is 1-based and only used in error messages
    pub fn from_input(input: &BorrowingItemInput, position: usize) -> AppResult<Self> {
        let item_description = input
            .item_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!("items[{}]: item_description is required", position))
            })?
            .to_string();

        let quantity_requested = input.quantity_requested.ok_or_else(|| {
            AppError::Validation(format!("items[{}]: quantity_requested is required", position))
        })?;
        if quantity_requested <= 0 {
            return Err(AppError::Validation(format!(
                "items[{}]: quantity_requested must be greater than zero",
                position
            )));
        }

        if let Some(value) = input.estimated_value {
            if value.is_sign_negative() {
                return Err(AppError::Validation(format!(
                    "items[{}]: estimated_value must not be negative",
                    position
                )));
            }
        }

        Ok(Self {
            item_type_id: input.item_type_id,
            material_id: input.material_id,
            item_description,
            quantity_requested,
            estimated_value: input.estimated_value,
        })
    }
}

/// Create borrowing request body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateBorrowingRequest {
    pub customer_id: Option<i32>,
    pub employee_id: Option<i32>,
    pub location_id: Option<i32>,
    pub required_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<BorrowingItemInput>,
}

/// Create request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrowingRequest {
    pub customer_id: i32,
    pub employee_id: i32,
    pub location_id: i32,
    pub required_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewBorrowingItem>,
}

fn required<T: Copy>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

impl CreateBorrowingRequest {
    pub fn validate_new(&self) -> AppResult<NewBorrowingRequest> {
        let customer_id = required(self.customer_id, "customer_id")?;
        let employee_id = required(self.employee_id, "employee_id")?;
        let location_id = required(self.location_id, "location_id")?;
        let required_date = required(self.required_date, "required_date")?;

        if let Some(return_date) = self.expected_return_date {
            if return_date < required_date {
                return Err(AppError::Validation(
                    "expected_return_date must not be before required_date".to_string(),
                ));
            }
        }

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| NewBorrowingItem::from_input(item, i + 1))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(NewBorrowingRequest {
            customer_id,
            employee_id,
            location_id,
            required_date,
            expected_return_date: self.expected_return_date,
            purpose: self.purpose.clone(),
            notes: self.notes.clone(),
            items,
        })
    }
}

/// Update borrowing request body; status is never edited here
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBorrowingRequest {
    pub customer_id: Option<i32>,
    pub employee_id: Option<i32>,
    pub location_id: Option<i32>,
    pub required_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

/// Approved quantity for one line item
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ItemApproval {
    pub id: i32,
    pub quantity_approved: i32,
}

/// Approve body; items without an entry are approved in full
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ApproveBorrowingRequest {
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemApproval>,
}

/// Reject body; the reason is stored in the request notes
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RejectBorrowingRequest {
    pub reason: Option<String>,
}

/// Borrowing line item row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingItem {
    pub id: i32,
    pub borrowing_request_id: i32,
    pub item_type_id: Option<i32>,
    pub material_id: Option<i32>,
    pub item_description: String,
    pub quantity_requested: i32,
    pub quantity_approved: Option<i32>,
    pub quantity_borrowed: Option<i32>,
    pub estimated_value: Option<Decimal>,
}

impl BorrowingItem {
    /// Quantity handed out on borrow when no explicit quantity is given
    pub fn default_borrow_quantity(&self) -> i32 {
        self.quantity_approved.unwrap_or(self.quantity_requested)
    }
}

/// Add a line item to an existing request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBorrowingItem {
    pub borrowing_request_id: i32,
    #[serde(flatten)]
    pub item: BorrowingItemInput,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBorrowingItem {
    pub item_type_id: Option<i32>,
    pub material_id: Option<i32>,
    pub item_description: Option<String>,
    pub quantity_requested: Option<i32>,
    pub estimated_value: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingItemQuery {
    pub borrowing_request_id: Option<i32>,
    pub item_type_id: Option<i32>,
    pub material_id: Option<i32>,
    /// Matches the item description
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Result of the overdue sweep
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueSweep {
    pub marked: Vec<i32>,
    pub as_of: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BorrowingStatus::*;
    use LifecycleEvent::*;

    const ALL: [BorrowingStatus; 6] = [Pending, Approved, Rejected, Active, Completed, Overdue];

    #[test]
    fn test_only_pending_can_be_approved_or_rejected() {
        assert_eq!(Pending.apply(Approve).unwrap(), Approved);
        assert_eq!(Pending.apply(Reject).unwrap(), Rejected);
        for status in ALL.into_iter().filter(|s| *s != Pending) {
            assert!(matches!(status.apply(Approve), Err(AppError::InvalidState(_))));
            assert!(matches!(status.apply(Reject), Err(AppError::InvalidState(_))));
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let status = Pending.apply(Approve).unwrap();
        let status = status.apply(Borrow).unwrap();
        assert_eq!(status, Active);
        let status = status.apply(PartialReturn).unwrap();
        assert_eq!(status, Active);
        assert_eq!(status.apply(Return).unwrap(), Completed);
    }

    #[test]
    fn test_borrow_requires_approved() {
        for status in ALL.into_iter().filter(|s| *s != Approved) {
            assert!(status.apply(Borrow).is_err(), "borrow allowed from {}", status);
        }
    }

    #[test]
    fn test_returns_only_while_out() {
        for status in [Pending, Approved, Rejected, Completed] {
            assert!(status.apply(Return).is_err());
            assert!(status.apply(PartialReturn).is_err());
        }
        assert_eq!(Overdue.apply(Return).unwrap(), Completed);
        assert_eq!(Overdue.apply(PartialReturn).unwrap(), Overdue);
    }

    #[test]
    fn test_overdue_only_from_active() {
        assert_eq!(Active.apply(MarkOverdue).unwrap(), Overdue);
        for status in ALL.into_iter().filter(|s| *s != Active) {
            assert!(status.apply(MarkOverdue).is_err());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(Rejected.is_terminal());
        assert!(Completed.is_terminal());
        assert!(!Overdue.is_terminal());
    }

    #[test]
    fn test_transition_error_explains() {
        match Approved.apply(Approve) {
            Err(AppError::InvalidState(msg)) => {
                assert!(msg.contains("'approved'"));
                assert!(msg.contains("pending"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_create_example_request_is_valid() {
        let body: CreateBorrowingRequest = serde_json::from_value(serde_json::json!({
            "customer_id": 1,
            "employee_id": 2,
            "location_id": 1,
            "required_date": "2025-02-01",
            "purpose": "tools",
            "items": [{"item_description": "Hammer", "quantity_requested": 2}]
        }))
        .unwrap();

        let new = body.validate_new().unwrap();
        assert_eq!(new.items.len(), 1);
        assert_eq!(new.items[0].quantity_requested, 2);
        assert_eq!(new.items[0].item_description, "Hammer");
    }

    #[test]
    fn test_missing_item_fields_reject_whole_request() {
        let mut body = CreateBorrowingRequest {
            customer_id: Some(1),
            employee_id: Some(2),
            location_id: Some(1),
            required_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            items: vec![
                BorrowingItemInput {
                    item_description: Some("Hammer".into()),
                    quantity_requested: Some(2),
                    ..Default::default()
                },
                BorrowingItemInput {
                    item_description: Some("  ".into()),
                    quantity_requested: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        match body.validate_new() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("items[2]: item_description")),
            other => panic!("unexpected: {:?}", other),
        }

        body.items[1].item_description = Some("Saw".into());
        body.items[1].quantity_requested = None;
        match body.validate_new() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("quantity_requested is required")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_header_field_is_named() {
        let body = CreateBorrowingRequest {
            customer_id: Some(1),
            location_id: Some(1),
            required_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        match body.validate_new() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "employee_id is required"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_return_date_before_required_date() {
        let body = CreateBorrowingRequest {
            customer_id: Some(1),
            employee_id: Some(1),
            location_id: Some(1),
            required_date: NaiveDate::from_ymd_opt(2025, 2, 10),
            expected_return_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        assert!(body.validate_new().is_err());
    }
}
