//! Material category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub material_count: i64,
    pub item_type_count: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategorySort {
    #[default]
    Name,
    CreatedAt,
}

impl SortKey for CategorySort {
    fn column(self) -> &'static str {
        match self {
            CategorySort::Name => "name",
            CategorySort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CategoryQuery {
    /// Matches name or description
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub sort_by: Option<CategorySort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create category request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    pub description: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<RecordStatus>,
}
