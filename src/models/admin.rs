//! Admin account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    auth::{parse_permissions, AdminRole, Permission},
    enums::{RecordStatus, SortDirection, SortKey},
};

/// Admin row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Argon2 hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: AdminRole,
    pub permissions: Vec<String>,
    pub status: RecordStatus,
    #[serde(skip_serializing)]
    pub remember_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub remember_token_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Whether the stored remember-me digest may still open a session
    pub fn remember_token_live(&self, now: DateTime<Utc>) -> bool {
        self.remember_token_hash.is_some()
            && self.remember_token_expires_at.is_some_and(|expires| expires > now)
    }

    pub fn granted_permissions(&self) -> Vec<Permission> {
        parse_permissions(&self.permissions)
    }
}

/// Admin with light aggregation for the detail view
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub admin: Admin,
    pub activity_count: i64,
}

/// Sortable admin columns
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminSort {
    #[default]
    Username,
    Email,
    Role,
    CreatedAt,
    LastLoginAt,
}

impl SortKey for AdminSort {
    fn column(self) -> &'static str {
        match self {
            AdminSort::Username => "username",
            AdminSort::Email => "email",
            AdminSort::Role => "role",
            AdminSort::CreatedAt => "created_at",
            AdminSort::LastLoginAt => "last_login_at",
        }
    }
}

/// Admin list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AdminQuery {
    /// Matches username, email or full name
    pub search: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<RecordStatus>,
    pub sort_by: Option<AdminSort>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create admin request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdmin {
    #[validate(length(min = 3, max = 64, message = "must be 3 to 64 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub permissions: Option<Vec<Permission>>,
    pub status: Option<RecordStatus>,
}

/// Update admin request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAdmin {
    #[validate(length(min = 3, max = 64, message = "must be 3 to 64 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub permissions: Option<Vec<Permission>>,
    pub status: Option<RecordStatus>,
}

/// Flat admin row used by CSV import/export; permissions are `;`-separated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCsvRow {
    #[serde(default)]
    pub id: Option<i32>,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub permissions: Option<String>,
    pub status: Option<RecordStatus>,
}

impl From<&Admin> for AdminCsvRow {
    fn from(admin: &Admin) -> Self {
        Self {
            id: Some(admin.id),
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: None,
            full_name: admin.full_name.clone(),
            role: Some(admin.role),
            permissions: Some(admin.permissions.join(";")),
            status: Some(admin.status),
        }
    }
}

impl AdminCsvRow {
    pub fn into_create(self) -> Result<CreateAdmin, String> {
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "password is required".to_string())?;
        let permissions = match self.permissions {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.split(';')
                    .map(|p| p.trim().parse::<Permission>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => None,
        };
        Ok(CreateAdmin {
            username: self.username,
            email: self.email,
            password,
            full_name: self.full_name,
            role: self.role,
            permissions,
            status: self.status,
        })
    }
}

/// Change own password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_row_into_create() {
        let row = AdminCsvRow {
            id: None,
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password: Some("s3cret-pass".to_string()),
            full_name: None,
            role: Some(AdminRole::Admin),
            permissions: Some("materials.view; borrowing.approve".to_string()),
            status: None,
        };
        let create = row.into_create().unwrap();
        assert_eq!(
            create.permissions,
            Some(vec![Permission::ViewMaterials, Permission::ApproveBorrowing])
        );
    }

    #[test]
    fn test_csv_row_requires_password_and_known_permissions() {
        let mut row = AdminCsvRow {
            id: None,
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password: None,
            full_name: None,
            role: None,
            permissions: None,
            status: None,
        };
        assert_eq!(row.clone().into_create().unwrap_err(), "password is required");

        row.password = Some("s3cret-pass".to_string());
        row.permissions = Some("materials.fly".to_string());
        assert!(row.into_create().unwrap_err().contains("materials.fly"));
    }

    #[test]
    fn test_create_admin_validation() {
        let admin = CreateAdmin {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            full_name: None,
            role: None,
            permissions: None,
            status: None,
        };
        let errors = admin.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_remember_token_expires_server_side() {
        let now = Utc::now();
        let mut admin = Admin {
            id: 7,
            username: "keeper".to_string(),
            email: "keeper@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role: AdminRole::Admin,
            permissions: Vec::new(),
            status: RecordStatus::Active,
            remember_token_hash: Some("ab".repeat(32)),
            remember_token_expires_at: Some(now + chrono::Duration::days(1)),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(admin.remember_token_live(now));

        admin.remember_token_expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(!admin.remember_token_live(now));

        // A digest without an expiry never matches
        admin.remember_token_expires_at = None;
        assert!(!admin.remember_token_live(now));
    }
}
