//! Borrowing requests and their line items

use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};

use super::{
    ensure_active,
    query::{push_order_and_page, push_page, set, Conditions},
    Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::borrowing::{
        ApproveBorrowingRequest, BorrowingItem, BorrowingItemQuery, BorrowingRequest,
        BorrowingRequestDetails, BorrowingRequestQuery, BorrowingRequestSummary, BorrowingStatus,
        LifecycleEvent, NewBorrowingItem, NewBorrowingRequest, UpdateBorrowingItem,
        UpdateBorrowingRequest,
    },
};

const REQUEST_FROM: &str = r#"
    FROM borrowing_requests br
    JOIN customers c ON c.id = br.customer_id
    JOIN employees e ON e.id = br.employee_id
    JOIN locations l ON l.id = br.location_id"#;

const SUMMARY_COLUMNS: &str = r#"
    SELECT br.id, br.customer_id, c.name AS customer_name,
           br.employee_id, (e.first_name || ' ' || e.last_name) AS employee_name,
           br.location_id, l.name AS location_name,
           br.request_date, br.required_date, br.expected_return_date, br.purpose,
           br.status, br.approved_by, br.approved_date,
           (SELECT COUNT(*) FROM borrowing_items bi WHERE bi.borrowing_request_id = br.id) AS item_count"#;

#[derive(FromRow)]
struct RequestHeader {
    #[sqlx(flatten)]
    request: BorrowingRequest,
    customer_name: String,
    employee_name: String,
    location_name: String,
    approved_by_name: Option<String>,
}

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &BorrowingRequestQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["br.purpose", "br.notes", "c.name"], query.search.as_deref());
    c.eq("br.status", query.status);
    c.eq("br.customer_id", query.customer_id);
    c.eq("br.employee_id", query.employee_id);
    c.eq("br.location_id", query.location_id);
    c.gte("br.required_date", query.date_from);
    c.lte("br.required_date", query.date_to);
}

fn push_item_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &BorrowingItemQuery) {
    let mut c = Conditions::new(qb);
    c.eq("borrowing_request_id", query.borrowing_request_id);
    c.eq("item_type_id", query.item_type_id);
    c.eq("material_id", query.material_id);
    c.search(&["item_description"], query.search.as_deref());
}

/// Load a request and lock it for the rest of the transaction
pub(crate) async fn lock_request(conn: &mut PgConnection, id: i32) -> AppResult<BorrowingRequest> {
    sqlx::query_as::<_, BorrowingRequest>(
        "SELECT * FROM borrowing_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Borrowing request {} not found", id)))
}

/// Items of a request, locked for the rest of the transaction
pub(crate) async fn lock_items(conn: &mut PgConnection, request_id: i32) -> AppResult<Vec<BorrowingItem>> {
    let rows = sqlx::query_as::<_, BorrowingItem>(
        "SELECT * FROM borrowing_items WHERE borrowing_request_id = $1 ORDER BY id FOR UPDATE",
    )
    .bind(request_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn ensure_item_references(
    conn: &mut PgConnection,
    item_type_id: Option<i32>,
    material_id: Option<i32>,
) -> AppResult<()> {
    if let Some(id) = item_type_id {
        ensure_active(conn, "item_types", "Item type", id).await?;
    }
    if let Some(id) = material_id {
        ensure_active(conn, "materials", "Material", id).await?;
    }
    Ok(())
}

async fn insert_item(
    conn: &mut PgConnection,
    request_id: i32,
    item: &NewBorrowingItem,
) -> AppResult<BorrowingItem> {
    let row = sqlx::query_as::<_, BorrowingItem>(
        r#"
        INSERT INTO borrowing_items (
            borrowing_request_id, item_type_id, material_id,
            item_description, quantity_requested, estimated_value
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(request_id)
    .bind(item.item_type_id)
    .bind(item.material_id)
    .bind(&item.item_description)
    .bind(item.quantity_requested)
    .bind(item.estimated_value)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Items can only be edited while their request is pending
async fn lock_pending_item(conn: &mut PgConnection, id: i32) -> AppResult<BorrowingItem> {
    let item = sqlx::query_as::<_, BorrowingItem>("SELECT * FROM borrowing_items WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing item {} not found", id)))?;

    let request = lock_request(conn, item.borrowing_request_id).await?;
    if request.status != BorrowingStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "Items of a request with status '{}' cannot be changed; the request must be pending",
            request.status
        )));
    }
    Ok(item)
}

/// Run a pending-only transition as a conditional update; when no row
/// matches, report why.
async fn decide(
    conn: &mut PgConnection,
    id: i32,
    event: LifecycleEvent,
    admin_id: i32,
    notes: Option<&str>,
) -> AppResult<BorrowingRequest> {
    let next = BorrowingStatus::Pending.apply(event)?;
    let updated = sqlx::query_as::<_, BorrowingRequest>(
        r#"
        UPDATE borrowing_requests
        SET status = $2, approved_by = $3, approved_date = NOW(),
            notes = COALESCE($4, notes), updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next)
    .bind(admin_id)
    .bind(notes)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(request) = updated {
        return Ok(request);
    }

    let current: Option<BorrowingStatus> =
        sqlx::query_scalar("SELECT status FROM borrowing_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    match current {
        None => Err(AppError::NotFound(format!("Borrowing request {} not found", id))),
        Some(status) => Err(status.apply(event).err().unwrap_or_else(|| {
            AppError::InvalidState(format!("Borrowing request {} changed concurrently", id))
        })),
    }
}

impl Repository {
    /// List borrowing requests with display names, filters and pagination
    pub async fn borrowing_list(
        &self,
        query: &BorrowingRequestQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingRequestSummary>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*)");
        count.push(REQUEST_FROM);
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(SUMMARY_COLUMNS);
        select.push(REQUEST_FROM);
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "br.id",
            per_page,
            offset,
        );
        let rows = select
            .build_query_as::<BorrowingRequestSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Every borrowing request with display names, for export
    pub async fn borrowing_all(&self) -> AppResult<Vec<BorrowingRequestSummary>> {
        let sql = format!("{}{} ORDER BY br.id", SUMMARY_COLUMNS, REQUEST_FROM);
        let rows = sqlx::query_as::<_, BorrowingRequestSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get the bare request row
    pub async fn borrowing_get_request(&self, id: i32) -> AppResult<BorrowingRequest> {
        sqlx::query_as::<_, BorrowingRequest>("SELECT * FROM borrowing_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing request {} not found", id)))
    }

    /// Get a request with names, items and transactions
    pub async fn borrowing_get(&self, id: i32) -> AppResult<BorrowingRequestDetails> {
        let sql = format!(
            r#"
            SELECT br.*, c.name AS customer_name,
                   (e.first_name || ' ' || e.last_name) AS employee_name,
                   l.name AS location_name,
                   COALESCE(a.full_name, a.username) AS approved_by_name
            {}
            LEFT JOIN admins a ON a.id = br.approved_by
            WHERE br.id = $1
            "#,
            REQUEST_FROM
        );
        let header = sqlx::query_as::<_, RequestHeader>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing request {} not found", id)))?;

        let items = sqlx::query_as::<_, BorrowingItem>(
            "SELECT * FROM borrowing_items WHERE borrowing_request_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let transactions = self.transactions_for_request(id).await?;

        Ok(BorrowingRequestDetails {
            request: header.request,
            customer_name: header.customer_name,
            employee_name: header.employee_name,
            location_name: header.location_name,
            approved_by_name: header.approved_by_name,
            items,
            transactions,
        })
    }

    /// Insert a pending request and its items atomically
    pub async fn borrowing_create(&self, data: &NewBorrowingRequest) -> AppResult<BorrowingRequest> {
        let mut tx = self.pool.begin().await?;

        ensure_active(&mut tx, "customers", "Customer", data.customer_id).await?;
        ensure_active(&mut tx, "employees", "Employee", data.employee_id).await?;
        ensure_active(&mut tx, "locations", "Location", data.location_id).await?;

        let request = sqlx::query_as::<_, BorrowingRequest>(
            r#"
            INSERT INTO borrowing_requests (
                customer_id, employee_id, location_id, required_date,
                expected_return_date, purpose, notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(data.customer_id)
        .bind(data.employee_id)
        .bind(data.location_id)
        .bind(data.required_date)
        .bind(data.expected_return_date)
        .bind(&data.purpose)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &data.items {
            ensure_item_references(&mut tx, item.item_type_id, item.material_id).await?;
            insert_item(&mut tx, request.id, item).await?;
        }

        tx.commit().await?;
        Ok(request)
    }

    /// Edit descriptive fields of a request that is not yet closed
    pub async fn borrowing_update(
        &self,
        id: i32,
        data: &UpdateBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let mut tx = self.pool.begin().await?;

        let current = lock_request(&mut tx, id).await?;
        if current.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Cannot update a request with status '{}'",
                current.status
            )));
        }

        if let Some(customer_id) = data.customer_id {
            ensure_active(&mut tx, "customers", "Customer", customer_id).await?;
        }
        if let Some(employee_id) = data.employee_id {
            ensure_active(&mut tx, "employees", "Employee", employee_id).await?;
        }
        if let Some(location_id) = data.location_id {
            ensure_active(&mut tx, "locations", "Location", location_id).await?;
        }

        let required_date = data.required_date.unwrap_or(current.required_date);
        let expected_return_date = data.expected_return_date.or(current.expected_return_date);
        if expected_return_date.is_some_and(|d| d < required_date) {
            return Err(AppError::Validation(
                "expected_return_date must not be before required_date".to_string(),
            ));
        }

        let mut qb = QueryBuilder::new("UPDATE borrowing_requests SET updated_at = NOW()");
        set(&mut qb, "customer_id", data.customer_id);
        set(&mut qb, "employee_id", data.employee_id);
        set(&mut qb, "location_id", data.location_id);
        set(&mut qb, "required_date", data.required_date);
        set(&mut qb, "expected_return_date", data.expected_return_date);
        set(&mut qb, "purpose", data.purpose.as_deref());
        set(&mut qb, "notes", data.notes.as_deref());
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let request = qb
            .build_query_as::<BorrowingRequest>()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(request)
    }

    /// Approve a pending request, fixing the approved quantity of every item
    pub async fn borrowing_approve(
        &self,
        id: i32,
        admin_id: i32,
        data: &ApproveBorrowingRequest,
    ) -> AppResult<BorrowingRequest> {
        let mut tx = self.pool.begin().await?;

        let request = decide(&mut tx, id, LifecycleEvent::Approve, admin_id, data.notes.as_deref()).await?;
        let items = lock_items(&mut tx, id).await?;

        for approval in &data.items {
            let item = items.iter().find(|i| i.id == approval.id).ok_or_else(|| {
                AppError::Validation(format!(
                    "borrowing item {} does not belong to this request",
                    approval.id
                ))
            })?;
            if approval.quantity_approved < 0 || approval.quantity_approved > item.quantity_requested {
                return Err(AppError::Validation(format!(
                    "borrowing item {}: quantity_approved must be between 0 and {}",
                    item.id, item.quantity_requested
                )));
            }
        }

        for item in &items {
            let quantity = data
                .items
                .iter()
                .rev()
                .find(|a| a.id == item.id)
                .map(|a| a.quantity_approved)
                .unwrap_or(item.quantity_requested);
            sqlx::query("UPDATE borrowing_items SET quantity_approved = $2 WHERE id = $1")
                .bind(item.id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(request)
    }

    /// Reject a pending request; the reason replaces the notes when given
    pub async fn borrowing_reject(
        &self,
        id: i32,
        admin_id: i32,
        reason: Option<&str>,
    ) -> AppResult<BorrowingRequest> {
        let mut tx = self.pool.begin().await?;
        let request = decide(&mut tx, id, LifecycleEvent::Reject, admin_id, reason).await?;
        tx.commit().await?;
        Ok(request)
    }

    /// Delete requests with everything hanging off them, all or nothing
    pub async fn borrowing_delete(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        for &id in ids {
            lock_request(&mut tx, id).await?;

            sqlx::query(
                r#"
                DELETE FROM damage_reports WHERE return_item_id IN (
                    SELECT ri.id FROM return_items ri
                    JOIN borrowing_transactions t ON t.id = ri.borrowing_transaction_id
                    WHERE t.borrowing_request_id = $1
                )
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                DELETE FROM return_items WHERE borrowing_transaction_id IN (
                    SELECT id FROM borrowing_transactions WHERE borrowing_request_id = $1
                )
                "#,
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM borrowing_transactions WHERE borrowing_request_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM borrowing_items WHERE borrowing_request_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM borrowing_requests WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }

    /// Flag active requests whose expected return date has passed
    pub async fn borrowing_mark_overdue(&self) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE borrowing_requests
            SET status = 'overdue', updated_at = NOW()
            WHERE status = 'active'
              AND expected_return_date IS NOT NULL
              AND expected_return_date < CURRENT_DATE
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// List line items across requests
    pub async fn borrowing_items_list(
        &self,
        query: &BorrowingItemQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<BorrowingItem>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM borrowing_items");
        push_item_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM borrowing_items");
        push_item_filters(&mut select, query);
        select.push(" ORDER BY borrowing_request_id, id");
        push_page(&mut select, per_page, offset);
        let rows = select
            .build_query_as::<BorrowingItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Get line item by ID
    pub async fn borrowing_items_get(&self, id: i32) -> AppResult<BorrowingItem> {
        sqlx::query_as::<_, BorrowingItem>("SELECT * FROM borrowing_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing item {} not found", id)))
    }

    /// Add a line item to a pending request
    pub async fn borrowing_items_create(
        &self,
        request_id: i32,
        item: &NewBorrowingItem,
    ) -> AppResult<BorrowingItem> {
        let mut tx = self.pool.begin().await?;

        let request = lock_request(&mut tx, request_id).await?;
        if request.status != BorrowingStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Cannot add items to a request with status '{}'; the request must be pending",
                request.status
            )));
        }
        ensure_item_references(&mut tx, item.item_type_id, item.material_id).await?;
        let row = insert_item(&mut tx, request_id, item).await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Update a line item of a pending request
    pub async fn borrowing_items_update(
        &self,
        id: i32,
        data: &UpdateBorrowingItem,
    ) -> AppResult<BorrowingItem> {
        let mut tx = self.pool.begin().await?;

        lock_pending_item(&mut tx, id).await?;
        ensure_item_references(&mut tx, data.item_type_id, data.material_id).await?;

        let row = sqlx::query_as::<_, BorrowingItem>(
            r#"
            UPDATE borrowing_items
            SET item_type_id = COALESCE($2, item_type_id),
                material_id = COALESCE($3, material_id),
                item_description = COALESCE($4, item_description),
                quantity_requested = COALESCE($5, quantity_requested),
                estimated_value = COALESCE($6, estimated_value)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.item_type_id)
        .bind(data.material_id)
        .bind(data.item_description.as_deref().map(str::trim))
        .bind(data.quantity_requested)
        .bind(data.estimated_value)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Delete line items of pending requests, all or nothing
    pub async fn borrowing_items_delete(&self, ids: &[i32]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        for &id in ids {
            lock_pending_item(&mut tx, id).await?;
            sqlx::query("DELETE FROM borrowing_items WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }
}
