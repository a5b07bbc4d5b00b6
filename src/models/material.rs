//! Material (stock item) model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RecordStatus, SortDirection, SortKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Material {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub item_type_id: Option<i32>,
    pub location_id: Option<i32>,
    pub unit: Option<String>,
    pub quantity: i32,
    pub min_quantity: i32,
    pub unit_price: Option<Decimal>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MaterialDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub material: Material,
    pub category_name: Option<String>,
    pub item_type_name: Option<String>,
    pub location_name: Option<String>,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSort {
    #[default]
    Name,
    Code,
    Quantity,
    UnitPrice,
    CreatedAt,
}

impl SortKey for MaterialSort {
    fn column(self) -> &'static str {
        match self {
            MaterialSort::Name => "name",
            MaterialSort::Code => "code",
            MaterialSort::Quantity => "quantity",
            MaterialSort::UnitPrice => "unit_price",
            MaterialSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MaterialQuery {
    /// Matches code, name or description
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
    pub category_id: Option<i32>,
    pub item_type_id: Option<i32>,
    pub location_id: Option<i32>,
    /// Only materials at or below their minimum quantity
    pub low_stock: Option<bool>,
    pub sort_by: Option<MaterialSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create material request; also the CSV import row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMaterial {
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub item_type_id: Option<i32>,
    pub location_id: Option<i32>,
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub min_quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterial {
    #[validate(length(min = 1, max = 64, message = "must not be empty"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub item_type_id: Option<i32>,
    pub location_id: Option<i32>,
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub min_quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub status: Option<RecordStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_quantities_rejected() {
        let m = CreateMaterial {
            code: "HAM-01".to_string(),
            name: "Hammer".to_string(),
            description: None,
            category_id: 1,
            item_type_id: None,
            location_id: None,
            unit: Some("pcs".to_string()),
            quantity: Some(-1),
            min_quantity: Some(0),
            unit_price: None,
            status: None,
        };
        let errors = m.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
    }
}
