//! Customer domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::customer::{CreateCustomer, Customer, CustomerDetails, CustomerQuery, UpdateCustomer},
};

pub const CUSTOMER_REFERENCES: &[Reference] = &[Reference {
    table: "borrowing_requests",
    column: "customer_id",
    label: "borrowing request(s)",
}];

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &CustomerQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["name", "email", "phone", "organization"], query.search.as_deref());
    c.eq("status", query.status);
    c.eq_ci("customer_type", query.customer_type.as_deref());
}

impl Repository {
    /// List customers with filters, sorting and pagination
    pub async fn customers_list(
        &self,
        query: &CustomerQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Customer>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM customers");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM customers");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<Customer>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every customer, for export
    pub async fn customers_all(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get customer by ID with request counters
    pub async fn customers_get(&self, id: i32) -> AppResult<CustomerDetails> {
        sqlx::query_as::<_, CustomerDetails>(
            r#"
            SELECT c.*,
                   (SELECT COUNT(*) FROM borrowing_requests r WHERE r.customer_id = c.id) AS total_requests,
                   (SELECT COUNT(*) FROM borrowing_requests r
                     WHERE r.customer_id = c.id
                       AND r.status NOT IN ('completed', 'rejected')) AS open_requests
            FROM customers c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    /// Create customer
    pub async fn customers_create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, organization, customer_type, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.email.as_deref().map(str::trim))
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.organization)
        .bind(&data.customer_type)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of a customer
    pub async fn customers_update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        let mut qb = QueryBuilder::new("UPDATE customers SET updated_at = NOW()");
        set(&mut qb, "name", data.name.as_deref().map(str::trim));
        set(&mut qb, "email", data.email.as_deref().map(str::trim));
        set(&mut qb, "phone", data.phone.as_deref());
        set(&mut qb, "address", data.address.as_deref());
        set(&mut qb, "organization", data.organization.as_deref());
        set(&mut qb, "customer_type", data.customer_type.as_deref());
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Customer>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }
}
