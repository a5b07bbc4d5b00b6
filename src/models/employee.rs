//! Employee model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

/// Employee row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: i32,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub location_id: Option<i32>,
    pub status: RecordStatus,
    pub hire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee with workload counters
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EmployeeDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub employee: Employee,
    pub location_name: Option<String>,
    pub requests_handled: i64,
    pub transactions_processed: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeSort {
    #[default]
    LastName,
    FirstName,
    EmployeeNumber,
    Department,
    HireDate,
    CreatedAt,
}

impl SortKey for EmployeeSort {
    fn column(self) -> &'static str {
        match self {
            EmployeeSort::LastName => "last_name",
            EmployeeSort::FirstName => "first_name",
            EmployeeSort::EmployeeNumber => "employee_number",
            EmployeeSort::Department => "department",
            EmployeeSort::HireDate => "hire_date",
            EmployeeSort::CreatedAt => "created_at",
        }
    }
}

/// Employee list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Matches names, employee number or email
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub department: Option<String>,
    pub location_id: Option<i32>,
    pub sort_by: Option<EmployeeSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create employee request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployee {
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub employee_number: String,
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub location_id: Option<i32>,
    pub status: Option<RecordStatus>,
    pub hire_date: Option<NaiveDate>,
}

/// Update employee request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    #[validate(length(min = 1, max = 64, message = "must not be empty"))]
    pub employee_number: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub last_name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub location_id: Option<i32>,
    pub status: Option<RecordStatus>,
    pub hire_date: Option<NaiveDate>,
}
