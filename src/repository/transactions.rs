//! Borrow/return transactions, return items and damage reports

use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};

use super::{
    borrowing::{lock_items, lock_request},
    ensure_active,
    query::{push_page, Conditions},
    Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::LifecycleEvent,
        transaction::{
            plan_borrow, plan_return, BorrowingTransaction, BorrowingTransactionDetails,
            CreateDamageReport, CreateReturnItem, CreateTransaction, DamageReport,
            DamageReportQuery, ItemCondition, ReturnItem, ReturnItemQuery, TransactionLine,
            TransactionQuery, TransactionType,
        },
    },
};

#[derive(FromRow)]
struct TransactionHeader {
    #[sqlx(flatten)]
    transaction: BorrowingTransaction,
    processed_by_name: String,
}

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &TransactionQuery) {
    let mut c = Conditions::new(qb);
    c.eq("borrowing_request_id", query.borrowing_request_id);
    c.eq("transaction_type", query.transaction_type);
    c.eq("processed_by", query.processed_by);
    c.gte("transaction_date::date", query.date_from);
    c.lte("transaction_date::date", query.date_to);
}

fn push_return_item_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &ReturnItemQuery) {
    let mut c = Conditions::new(qb);
    c.eq("ri.borrowing_transaction_id", query.borrowing_transaction_id);
    c.eq("ri.borrowing_item_id", query.borrowing_item_id);
    c.eq("t.borrowing_request_id", query.borrowing_request_id);
    c.eq("ri.condition_status", query.condition_status);
}

fn push_damage_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &DamageReportQuery) {
    let mut c = Conditions::new(qb);
    c.eq("d.return_item_id", query.return_item_id);
    c.eq("t.borrowing_request_id", query.borrowing_request_id);
    c.eq("d.reported_by", query.reported_by);
    c.eq_ci("d.damage_type", query.damage_type.as_deref());
}

const RETURN_ITEMS_FROM: &str = r#"
    FROM return_items ri
    JOIN borrowing_transactions t ON t.id = ri.borrowing_transaction_id"#;

const DAMAGE_REPORTS_FROM: &str = r#"
    FROM damage_reports d
    JOIN return_items ri ON ri.id = d.return_item_id
    JOIN borrowing_transactions t ON t.id = ri.borrowing_transaction_id"#;

/// Quantity already returned per item of a request
async fn returned_quantities(conn: &mut PgConnection, request_id: i32) -> AppResult<HashMap<i32, i32>> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT ri.borrowing_item_id, COALESCE(SUM(ri.quantity_returned), 0)::bigint
        FROM return_items ri
        JOIN borrowing_items bi ON bi.id = ri.borrowing_item_id
        WHERE bi.borrowing_request_id = $1
        GROUP BY ri.borrowing_item_id
        "#,
    )
    .bind(request_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(item_id, total)| (item_id, total as i32))
        .collect())
}

async fn insert_return_item(
    conn: &mut PgConnection,
    transaction_id: i32,
    borrowing_item_id: i32,
    quantity: i32,
    condition: ItemCondition,
    damage_notes: Option<&str>,
) -> AppResult<ReturnItem> {
    let row = sqlx::query_as::<_, ReturnItem>(
        r#"
        INSERT INTO return_items (
            borrowing_transaction_id, borrowing_item_id, quantity_returned,
            condition_status, damage_notes
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(borrowing_item_id)
    .bind(quantity)
    .bind(condition)
    .bind(damage_notes)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

impl Repository {
    /// Record a borrow or return event and move the request along.
    ///
    /// Everything happens under a lock on the request row, so two
    /// concurrent events on one request are applied one after the other.
    pub async fn transactions_create(&self, data: &CreateTransaction) -> AppResult<BorrowingTransaction> {
        let mut tx = self.pool.begin().await?;

        let request = lock_request(&mut tx, data.borrowing_request_id).await?;
        let next = request.status.apply(data.transaction_type.event())?;
        ensure_active(&mut tx, "employees", "Employee", data.processed_by).await?;

        let items = lock_items(&mut tx, request.id).await?;
        let lines: &[TransactionLine] = &data.items;

        let transaction = sqlx::query_as::<_, BorrowingTransaction>(
            r#"
            INSERT INTO borrowing_transactions (borrowing_request_id, transaction_type, processed_by, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(data.transaction_type)
        .bind(data.processed_by)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        match data.transaction_type {
            TransactionType::Borrow => {
                for plan in plan_borrow(&items, lines)? {
                    sqlx::query("UPDATE borrowing_items SET quantity_borrowed = $2 WHERE id = $1")
                        .bind(plan.borrowing_item_id)
                        .bind(plan.quantity)
                        .execute(&mut *tx)
                        .await?;
                }
            }
            TransactionType::Return | TransactionType::PartialReturn => {
                let returned = returned_quantities(&mut tx, request.id).await?;
                let full = data.transaction_type == TransactionType::Return;
                for plan in plan_return(&items, &returned, lines, full)? {
                    insert_return_item(
                        &mut tx,
                        transaction.id,
                        plan.borrowing_item_id,
                        plan.quantity_returned,
                        plan.condition_status,
                        plan.damage_notes.as_deref(),
                    )
                    .await?;
                }
            }
        }

        if next != request.status {
            sqlx::query("UPDATE borrowing_requests SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(request.id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(transaction)
    }

    /// List transactions, newest first
    pub async fn transactions_list(
        &self,
        query: &TransactionQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingTransaction>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM borrowing_transactions");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM borrowing_transactions");
        push_filters(&mut select, query);
        select.push(" ORDER BY transaction_date DESC, id DESC");
        push_page(&mut select, per_page, offset);
        let rows = select
            .build_query_as::<BorrowingTransaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Transactions of one request in chronological order
    pub async fn transactions_for_request(&self, request_id: i32) -> AppResult<Vec<BorrowingTransaction>> {
        let rows = sqlx::query_as::<_, BorrowingTransaction>(
            "SELECT * FROM borrowing_transactions WHERE borrowing_request_id = $1 ORDER BY transaction_date, id",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a transaction with the handling employee and its return items
    pub async fn transactions_get(&self, id: i32) -> AppResult<BorrowingTransactionDetails> {
        let header = sqlx::query_as::<_, TransactionHeader>(
            r#"
            SELECT t.*, (e.first_name || ' ' || e.last_name) AS processed_by_name
            FROM borrowing_transactions t
            JOIN employees e ON e.id = t.processed_by
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing transaction {} not found", id)))?;

        let return_items = sqlx::query_as::<_, ReturnItem>(
            "SELECT * FROM return_items WHERE borrowing_transaction_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BorrowingTransactionDetails {
            transaction: header.transaction,
            processed_by_name: header.processed_by_name,
            return_items,
        })
    }

    /// List return items
    pub async fn return_items_list(
        &self,
        query: &ReturnItemQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ReturnItem>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*)");
        count.push(RETURN_ITEMS_FROM);
        push_return_item_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT ri.*");
        select.push(RETURN_ITEMS_FROM);
        push_return_item_filters(&mut select, query);
        select.push(" ORDER BY ri.return_date DESC, ri.id DESC");
        push_page(&mut select, per_page, offset);
        let rows = select.build_query_as::<ReturnItem>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Get return item by ID
    pub async fn return_items_get(&self, id: i32) -> AppResult<ReturnItem> {
        sqlx::query_as::<_, ReturnItem>("SELECT * FROM return_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Return item {} not found", id)))
    }

    /// Attach another returned item to an existing return transaction
    pub async fn return_items_create(&self, data: &CreateReturnItem) -> AppResult<ReturnItem> {
        let mut tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, BorrowingTransaction>(
            "SELECT * FROM borrowing_transactions WHERE id = $1",
        )
        .bind(data.borrowing_transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference(format!(
                "Borrowing transaction {} does not exist",
                data.borrowing_transaction_id
            ))
        })?;
        if !transaction.transaction_type.is_return() {
            return Err(AppError::Validation(format!(
                "Borrowing transaction {} is not a return transaction",
                transaction.id
            )));
        }

        // Only requests still out may receive more returned items
        let request = lock_request(&mut tx, transaction.borrowing_request_id).await?;
        request.status.apply(LifecycleEvent::PartialReturn)?;
        let items = lock_items(&mut tx, transaction.borrowing_request_id).await?;
        let returned = returned_quantities(&mut tx, transaction.borrowing_request_id).await?;

        let line = TransactionLine {
            borrowing_item_id: data.borrowing_item_id,
            quantity: data.quantity_returned,
            condition_status: data.condition_status,
            damage_notes: data.damage_notes.clone(),
        };
        let plan = plan_return(&items, &returned, std::slice::from_ref(&line), false)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("empty return plan".to_string()))?;

        let row = insert_return_item(
            &mut tx,
            transaction.id,
            plan.borrowing_item_id,
            plan.quantity_returned,
            plan.condition_status,
            plan.damage_notes.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// List damage reports, newest first
    pub async fn damage_reports_list(
        &self,
        query: &DamageReportQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<DamageReport>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*)");
        count.push(DAMAGE_REPORTS_FROM);
        push_damage_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT d.*");
        select.push(DAMAGE_REPORTS_FROM);
        push_damage_filters(&mut select, query);
        select.push(" ORDER BY d.report_date DESC, d.id DESC");
        push_page(&mut select, per_page, offset);
        let rows = select.build_query_as::<DamageReport>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Get damage report by ID
    pub async fn damage_reports_get(&self, id: i32) -> AppResult<DamageReport> {
        sqlx::query_as::<_, DamageReport>("SELECT * FROM damage_reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Damage report {} not found", id)))
    }

    /// File a damage report against a returned item
    pub async fn damage_reports_create(&self, data: &CreateDamageReport) -> AppResult<DamageReport> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM return_items WHERE id = $1)")
            .bind(data.return_item_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::InvalidReference(format!(
                "Return item {} does not exist",
                data.return_item_id
            )));
        }
        ensure_active(&mut tx, "employees", "Employee", data.reported_by).await?;

        let row = sqlx::query_as::<_, DamageReport>(
            r#"
            INSERT INTO damage_reports (
                return_item_id, damage_type, damage_description,
                repair_cost, replacement_cost, reported_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.return_item_id)
        .bind(data.damage_type.trim())
        .bind(&data.damage_description)
        .bind(data.repair_cost)
        .bind(data.replacement_cost)
        .bind(data.reported_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}
