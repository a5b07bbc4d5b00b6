//! Admin account methods on Repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{Admin, AdminDetails, AdminQuery, CreateAdmin, UpdateAdmin},
        auth::Permission,
    },
};

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &AdminQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["username", "email", "full_name"], query.search.as_deref());
    c.eq("role", query.role);
    c.eq("status", query.status);
}

fn permission_slugs(permissions: &[Permission]) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_string()).collect()
}

/// Lock the active super-admin rows so concurrent deletes and demotions
/// of different super-admins serialize on the last-one check
async fn lock_active_super_admins(conn: &mut PgConnection) -> AppResult<()> {
    sqlx::query("SELECT id FROM admins WHERE role = 'super-admin' AND status = 'active' ORDER BY id FOR UPDATE")
        .fetch_all(&mut *conn)
        .await?;
    Ok(())
}

/// Number of active super-admins visible to `conn`
async fn count_active_super_admins(conn: &mut PgConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM admins WHERE role = 'super-admin' AND status = 'active'",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

impl Repository {
    /// List admins with filters, sorting and pagination
    pub async fn admins_list(
        &self,
        query: &AdminQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Admin>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM admins");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM admins");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<Admin>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every admin, for export
    pub async fn admins_all(&self) -> AppResult<Vec<Admin>> {
        let rows = sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get admin by ID
    pub async fn admins_get_by_id(&self, id: i32) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", id)))
    }

    /// Get admin by ID with the number of logged actions
    pub async fn admins_get(&self, id: i32) -> AppResult<AdminDetails> {
        sqlx::query_as::<_, AdminDetails>(
            r#"
            SELECT a.*,
                   (SELECT COUNT(*) FROM activity_logs l WHERE l.admin_id = a.id) AS activity_count
            FROM admins a
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", id)))
    }

    /// Find an admin by username or email (case-insensitive)
    pub async fn admins_find_by_login(&self, login: &str) -> AppResult<Option<Admin>> {
        let row = sqlx::query_as::<_, Admin>(
            "SELECT * FROM admins WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)",
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Find an admin by the SHA-256 digest of their remember-me token
    pub async fn admins_find_by_remember_hash(&self, token_hash: &str) -> AppResult<Option<Admin>> {
        let row = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE remember_token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Whether any admin account exists
    pub async fn admins_exist(&self) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create admin with an already hashed password
    pub async fn admins_create(&self, data: &CreateAdmin, password_hash: &str) -> AppResult<Admin> {
        let permissions = permission_slugs(data.permissions.as_deref().unwrap_or_default());
        let row = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (username, email, password_hash, full_name, role, permissions, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.username.trim())
        .bind(data.email.trim())
        .bind(password_hash)
        .bind(&data.full_name)
        .bind(data.role.unwrap_or_default())
        .bind(&permissions)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of an admin. Rolled back if it would leave
    /// no active super-admin.
    pub async fn admins_update(
        &self,
        id: i32,
        data: &UpdateAdmin,
        password_hash: Option<&str>,
    ) -> AppResult<Admin> {
        let mut tx = self.pool.begin().await?;
        lock_active_super_admins(&mut tx).await?;

        let mut qb = QueryBuilder::new("UPDATE admins SET updated_at = NOW()");
        set(&mut qb, "username", data.username.as_deref().map(str::trim));
        set(&mut qb, "email", data.email.as_deref().map(str::trim));
        set(&mut qb, "password_hash", password_hash);
        set(&mut qb, "full_name", data.full_name.as_deref());
        set(&mut qb, "role", data.role);
        set(&mut qb, "permissions", data.permissions.as_deref().map(permission_slugs));
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let admin = qb
            .build_query_as::<Admin>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", id)))?;

        if count_active_super_admins(&mut tx).await? == 0 {
            return Err(AppError::BadRequest(
                "At least one active super-admin must remain".to_string(),
            ));
        }

        tx.commit().await?;
        Ok(admin)
    }

    /// Delete admins in one transaction. Rolled back if no active
    /// super-admin would remain.
    pub async fn admins_delete(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        lock_active_super_admins(&mut tx).await?;

        for &id in ids {
            let result = sqlx::query("DELETE FROM admins WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Admin {} not found", id)));
            }
        }

        if count_active_super_admins(&mut tx).await? == 0 {
            return Err(AppError::BadRequest(
                "Cannot delete the last active super-admin".to_string(),
            ));
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }

    /// Replace the password hash
    pub async fn admins_set_password(&self, id: i32, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store the remember-me token digest with its expiry
    pub async fn admins_set_remember_token(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE admins SET remember_token_hash = $2, remember_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn admins_clear_remember_token(&self, id: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE admins SET remember_token_hash = NULL, remember_token_expires_at = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a successful login
    pub async fn admins_touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE admins SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
