//! Authentication context, roles and permissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Admin role. Only `super-admin` bypasses permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "admin_role")]
pub enum AdminRole {
    #[serde(rename = "super-admin")]
    #[sqlx(rename = "super-admin")]
    SuperAdmin,
    #[serde(rename = "admin")]
    #[sqlx(rename = "admin")]
    Admin,
    #[default]
    #[serde(rename = "operator")]
    #[sqlx(rename = "operator")]
    Operator,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super-admin",
            AdminRole::Admin => "admin",
            AdminRole::Operator => "operator",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability granted to an admin account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "admins.view")]
    ViewAdmins,
    #[serde(rename = "admins.manage")]
    ManageAdmins,
    #[serde(rename = "employees.view")]
    ViewEmployees,
    #[serde(rename = "employees.manage")]
    ManageEmployees,
    #[serde(rename = "customers.view")]
    ViewCustomers,
    #[serde(rename = "customers.manage")]
    ManageCustomers,
    #[serde(rename = "materials.view")]
    ViewMaterials,
    #[serde(rename = "materials.manage")]
    ManageMaterials,
    #[serde(rename = "categories.view")]
    ViewCategories,
    #[serde(rename = "categories.manage")]
    ManageCategories,
    #[serde(rename = "locations.view")]
    ViewLocations,
    #[serde(rename = "locations.manage")]
    ManageLocations,
    #[serde(rename = "item_types.view")]
    ViewItemTypes,
    #[serde(rename = "item_types.manage")]
    ManageItemTypes,
    #[serde(rename = "borrowing.view")]
    ViewBorrowing,
    #[serde(rename = "borrowing.manage")]
    ManageBorrowing,
    #[serde(rename = "borrowing.approve")]
    ApproveBorrowing,
    #[serde(rename = "transactions.process")]
    ProcessTransactions,
    #[serde(rename = "damage.report")]
    ReportDamage,
    #[serde(rename = "activity.view")]
    ViewActivity,
    #[serde(rename = "data.import")]
    ImportData,
    #[serde(rename = "data.export")]
    ExportData,
}

impl Permission {
    pub const ALL: [Permission; 22] = [
        Permission::ViewAdmins,
        Permission::ManageAdmins,
        Permission::ViewEmployees,
        Permission::ManageEmployees,
        Permission::ViewCustomers,
        Permission::ManageCustomers,
        Permission::ViewMaterials,
        Permission::ManageMaterials,
        Permission::ViewCategories,
        Permission::ManageCategories,
        Permission::ViewLocations,
        Permission::ManageLocations,
        Permission::ViewItemTypes,
        Permission::ManageItemTypes,
        Permission::ViewBorrowing,
        Permission::ManageBorrowing,
        Permission::ApproveBorrowing,
        Permission::ProcessTransactions,
        Permission::ReportDamage,
        Permission::ViewActivity,
        Permission::ImportData,
        Permission::ExportData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewAdmins => "admins.view",
            Permission::ManageAdmins => "admins.manage",
            Permission::ViewEmployees => "employees.view",
            Permission::ManageEmployees => "employees.manage",
            Permission::ViewCustomers => "customers.view",
            Permission::ManageCustomers => "customers.manage",
            Permission::ViewMaterials => "materials.view",
            Permission::ManageMaterials => "materials.manage",
            Permission::ViewCategories => "categories.view",
            Permission::ManageCategories => "categories.manage",
            Permission::ViewLocations => "locations.view",
            Permission::ManageLocations => "locations.manage",
            Permission::ViewItemTypes => "item_types.view",
            Permission::ManageItemTypes => "item_types.manage",
            Permission::ViewBorrowing => "borrowing.view",
            Permission::ManageBorrowing => "borrowing.manage",
            Permission::ApproveBorrowing => "borrowing.approve",
            Permission::ProcessTransactions => "transactions.process",
            Permission::ReportDamage => "damage.report",
            Permission::ViewActivity => "activity.view",
            Permission::ImportData => "data.import",
            Permission::ExportData => "data.export",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

/// Parse stored permission strings, skipping unknown entries
pub fn parse_permissions(raw: &[String]) -> Vec<Permission> {
    raw.iter()
        .filter_map(|s| match s.parse() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .collect()
}

/// Session payload kept in the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub admin_id: i32,
    pub username: String,
    pub role: AdminRole,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Login request; `login` is a username or an email address
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Successful login
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub admin: super::admin::Admin,
    pub permissions: Vec<Permission>,
    /// Raw remember-me token and its expiry, only set when requested
    #[serde(skip)]
    pub remember_token: Option<(String, DateTime<Utc>)>,
}

/// Current admin and effective permissions
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub admin: super::admin::Admin,
    pub permissions: Vec<Permission>,
}

/// Request-scoped identity of the acting admin
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthContext {
    pub admin_id: i32,
    pub username: String,
    pub role: AdminRole,
    pub permissions: Vec<Permission>,
    /// Session token backing this request, absent for remember-me only requests
    #[serde(skip)]
    pub session_token: Option<String>,
}

impl AuthContext {
    pub fn from_session(token: Option<String>, session: SessionData) -> Self {
        Self {
            admin_id: session.admin_id,
            username: session.username,
            role: session.role,
            permissions: session.permissions,
            session_token: token,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.is_super_admin() || self.permissions.contains(&permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing permission '{}'",
                permission
            )))
        }
    }

    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Super administrator privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: AdminRole, permissions: Vec<Permission>) -> AuthContext {
        AuthContext {
            admin_id: 1,
            username: "tester".to_string(),
            role,
            permissions,
            session_token: None,
        }
    }

    #[test]
    fn test_super_admin_bypasses_checks() {
        let ctx = context(AdminRole::SuperAdmin, vec![]);
        for p in Permission::ALL {
            assert!(ctx.require(p).is_ok());
        }
        assert!(ctx.require_super_admin().is_ok());
    }

    #[test]
    fn test_admin_needs_explicit_permission() {
        let ctx = context(AdminRole::Admin, vec![Permission::ViewMaterials]);
        assert!(ctx.require(Permission::ViewMaterials).is_ok());
        assert!(matches!(
            ctx.require(Permission::ManageMaterials),
            Err(AppError::Authorization(_))
        ));
        assert!(ctx.require_super_admin().is_err());
    }

    #[test]
    fn test_permission_slugs_roundtrip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(serde_json::to_string(&p).unwrap(), format!("\"{}\"", p.as_str()));
        }
    }

    #[test]
    fn test_parse_permissions_skips_unknown() {
        let raw = vec![
            "materials.view".to_string(),
            "bogus.perm".to_string(),
            "borrowing.approve".to_string(),
        ];
        assert_eq!(
            parse_permissions(&raw),
            vec![Permission::ViewMaterials, Permission::ApproveBorrowing]
        );
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&AdminRole::SuperAdmin).unwrap(), "\"super-admin\"");
        let role: AdminRole = serde_json::from_str("\"operator\"").unwrap();
        assert_eq!(role, AdminRole::Operator);
    }
}
