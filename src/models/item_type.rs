//! Item type model (kinds of things that can be borrowed)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemType {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ItemTypeDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item_type: ItemType,
    pub category_name: Option<String>,
    pub material_count: i64,
    pub borrowing_item_count: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemTypeSort {
    #[default]
    Name,
    CreatedAt,
}

impl SortKey for ItemTypeSort {
    fn column(self) -> &'static str {
        match self {
            ItemTypeSort::Name => "name",
            ItemTypeSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemTypeQuery {
    /// Matches name or description
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub category_id: Option<i32>,
    pub sort_by: Option<ItemTypeSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create item type request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemType {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemType {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<RecordStatus>,
}
