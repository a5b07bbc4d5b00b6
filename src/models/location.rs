//! Storage / work location model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    /// Free-form type, e.g. `warehouse`, `site`, `office`
    pub location_type: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LocationDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub location: Location,
    pub employee_count: i64,
    pub material_count: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationSort {
    #[default]
    Name,
    LocationType,
    CreatedAt,
}

impl SortKey for LocationSort {
    fn column(self) -> &'static str {
        match self {
            LocationSort::Name => "name",
            LocationSort::LocationType => "location_type",
            LocationSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LocationQuery {
    /// Matches name or address
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    #[serde(rename = "type")]
    pub location_type: Option<String>,
    pub sort_by: Option<LocationSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create location request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLocation {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    pub address: Option<String>,
    pub location_type: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLocation {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub location_type: Option<String>,
    pub status: Option<RecordStatus>,
}
