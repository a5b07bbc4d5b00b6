//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization: Option<String>,
    /// Free-form type, e.g. `individual` or `company`
    pub customer_type: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CustomerDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub customer: Customer,
    pub total_requests: i64,
    /// Requests not yet completed or rejected
    pub open_requests: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSort {
    #[default]
    Name,
    Email,
    Organization,
    CustomerType,
    CreatedAt,
}

impl SortKey for CustomerSort {
    fn column(self) -> &'static str {
        match self {
            CustomerSort::Name => "name",
            CustomerSort::Email => "email",
            CustomerSort::Organization => "organization",
            CustomerSort::CustomerType => "customer_type",
            CustomerSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CustomerQuery {
    /// Matches name, email, phone or organization
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    #[serde(rename = "type")]
    pub customer_type: Option<String>,
    pub sort_by: Option<CustomerSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create customer request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomer {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization: Option<String>,
    pub customer_type: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization: Option<String>,
    pub customer_type: Option<String>,
    pub status: Option<RecordStatus>,
}
