//! Activity log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLog {
    pub id: i64,
    pub admin_id: Option<i32>,
    /// Username of the acting admin, if the account still exists
    pub admin_username: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    pub admin_id: Option<i32>,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub action: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
