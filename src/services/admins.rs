//! Admin account management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, auth::hash_password, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{Admin, AdminCsvRow, AdminDetails, AdminQuery, CreateAdmin, UpdateAdmin},
        transfer::ImportReport,
        AdminRole, AuthContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AdminsService {
    repository: Repository,
    activity: ActivityService,
}

impl AdminsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &AdminQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Admin>, i64)> {
        self.repository.admins_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<AdminDetails> {
        self.repository.admins_get(id).await
    }

    async fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        id: Option<i32>,
    ) -> AppResult<()> {
        if let Some(username) = username.map(str::trim) {
            if self.repository.value_taken("admins", "username", username, id).await? {
                return Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    username
                )));
            }
        }
        if let Some(email) = email.map(str::trim) {
            if self.repository.value_taken("admins", "email", email, id).await? {
                return Err(AppError::Conflict(format!(
                    "An admin with email '{}' already exists",
                    email
                )));
            }
        }
        Ok(())
    }

    async fn insert(&self, actor: &AuthContext, data: &CreateAdmin) -> AppResult<Admin> {
        data.validate()?;
        if data.role == Some(AdminRole::SuperAdmin) {
            actor.require_super_admin()?;
        }
        self.check_unique(Some(&data.username), Some(&data.email), None)
            .await?;
        let password_hash = hash_password(&data.password)?;
        self.repository.admins_create(data, &password_hash).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateAdmin) -> AppResult<Admin> {
        let admin = self.insert(actor, &data).await?;
        tracing::info!(admin_id = admin.id, role = %admin.role, "Admin account created");
        self.activity
            .record(
                actor,
                "create",
                "admin",
                Some(admin.id),
                Some(json!({ "username": admin.username, "role": admin.role })),
            )
            .await;
        Ok(admin)
    }

    /// Update an admin. Touching a super-admin account, or promoting to
    /// super-admin, needs super-admin rights.
    pub async fn update(&self, actor: &AuthContext, id: i32, data: UpdateAdmin) -> AppResult<Admin> {
        data.validate()?;
        let current = self.repository.admins_get_by_id(id).await?;
        if current.role == AdminRole::SuperAdmin || data.role == Some(AdminRole::SuperAdmin) {
            actor.require_super_admin()?;
        }
        self.check_unique(data.username.as_deref(), data.email.as_deref(), Some(id))
            .await?;

        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        let admin = self
            .repository
            .admins_update(id, &data, password_hash.as_deref())
            .await?;

        let mut changed: Vec<&str> = Vec::new();
        if data.role.is_some_and(|r| r != current.role) {
            changed.push("role");
        }
        if data.status.is_some_and(|s| s != current.status) {
            changed.push("status");
        }
        if data.permissions.is_some() {
            changed.push("permissions");
        }
        if password_hash.is_some() {
            changed.push("password");
        }
        self.activity
            .record(
                actor,
                "update",
                "admin",
                Some(id),
                Some(json!({ "username": admin.username, "changed": changed })),
            )
            .await;
        Ok(admin)
    }

    /// Delete admin accounts, all or nothing. An admin cannot delete
    /// themself and only a super-admin may delete a super-admin.
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        if ids.contains(&actor.admin_id) {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }
        for &id in &ids {
            let target = self.repository.admins_get_by_id(id).await?;
            if target.role == AdminRole::SuperAdmin {
                actor.require_super_admin()?;
            }
        }

        let deleted = self.repository.admins_delete(&ids).await?;
        self.activity
            .record(actor, "delete", "admin", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    /// Flat rows for export; password hashes never leave the server
    pub async fn export(&self) -> AppResult<Vec<AdminCsvRow>> {
        let admins = self.repository.admins_all().await?;
        Ok(admins.iter().map(AdminCsvRow::from).collect())
    }

    /// Import admin accounts; every row must carry a password
    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |row: AdminCsvRow| async move {
            let data = row.into_create().map_err(AppError::Validation)?;
            self.insert(actor, &data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "admin", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
