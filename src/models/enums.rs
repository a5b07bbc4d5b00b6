//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Active flag carried by every reference entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn is_active(self) -> bool {
        self == RecordStatus::Active
    }
}

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Whitelisted sort column of a list endpoint
pub trait SortKey: Copy {
    /// SQL column expression; never derived from user input
    fn column(self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_serde() {
        assert_eq!(serde_json::to_string(&RecordStatus::Inactive).unwrap(), "\"inactive\"");
        let s: RecordStatus = serde_json::from_str("\"active\"").unwrap();
        assert!(s.is_active());
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::default().as_sql(), "ASC");
        let d: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(d.as_sql(), "DESC");
    }
}
