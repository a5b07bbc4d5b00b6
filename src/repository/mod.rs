//! Repository layer for database operations

pub mod activity;
pub mod admins;
pub mod borrowing;
pub mod categories;
pub mod customers;
pub mod employees;
pub mod item_types;
pub mod locations;
pub mod materials;
pub mod query;
pub mod transactions;

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::enums::RecordStatus,
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

/// A column in another table pointing at a row we want to delete
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub table: &'static str,
    pub column: &'static str,
    pub label: &'static str,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Case-insensitive uniqueness check on `table.column`, ignoring `exclude_id`
    pub async fn value_taken(
        &self,
        table: &'static str,
        column: &'static str,
        value: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER({}) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
            table, column
        );
        let taken: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .bind(exclude_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    /// Fail with `InvalidReference` unless `table` holds an active row `id`
    pub async fn ensure_active(&self, table: &'static str, label: &str, id: i32) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        ensure_active(&mut conn, table, label, id).await
    }

    /// Delete rows by id in one transaction. Any referenced id aborts the
    /// whole batch with `InUse`, any unknown id with `NotFound`.
    pub async fn delete_unreferenced(
        &self,
        table: &'static str,
        entity: &str,
        references: &[Reference],
        ids: &[i32],
    ) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", table);

        for &id in ids {
            ensure_unreferenced(&mut *tx, entity, id, references).await?;
            let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("{} {} not found", entity, id)));
            }
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }
}

pub(crate) async fn ensure_active(
    conn: &mut PgConnection,
    table: &'static str,
    label: &str,
    id: i32,
) -> AppResult<()> {
    let sql = format!("SELECT status FROM {} WHERE id = $1", table);
    let status: Option<RecordStatus> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match status {
        Some(RecordStatus::Active) => Ok(()),
        Some(RecordStatus::Inactive) => Err(AppError::InvalidReference(format!(
            "{} {} is inactive",
            label, id
        ))),
        None => Err(AppError::InvalidReference(format!("{} {} does not exist", label, id))),
    }
}

pub(crate) async fn ensure_unreferenced(
    conn: &mut PgConnection,
    entity: &str,
    id: i32,
    references: &[Reference],
) -> AppResult<()> {
    for r in references {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", r.table, r.column);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if count > 0 {
            return Err(AppError::InUse(format!(
                "{} {} is referenced by {} {}",
                entity, id, count, r.label
            )));
        }
    }
    Ok(())
}
