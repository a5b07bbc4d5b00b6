//! Employee domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::employee::{CreateEmployee, Employee, EmployeeDetails, EmployeeQuery, UpdateEmployee},
};

pub const EMPLOYEE_REFERENCES: &[Reference] = &[
    Reference { table: "borrowing_requests", column: "employee_id", label: "borrowing request(s)" },
    Reference { table: "borrowing_transactions", column: "processed_by", label: "transaction(s)" },
    Reference { table: "damage_reports", column: "reported_by", label: "damage report(s)" },
];

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &EmployeeQuery) {
    let mut c = Conditions::new(qb);
    c.search(
        &["first_name", "last_name", "employee_number", "email"],
        query.search.as_deref(),
    );
    c.eq("status", query.status);
    c.eq_ci("department", query.department.as_deref());
    c.eq("location_id", query.location_id);
}

impl Repository {
    /// List employees with filters, sorting and pagination
    pub async fn employees_list(
        &self,
        query: &EmployeeQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Employee>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM employees");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM employees");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<Employee>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every employee, for export
    pub async fn employees_all(&self) -> AppResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get employee by ID with location name and workload counters
    pub async fn employees_get(&self, id: i32) -> AppResult<EmployeeDetails> {
        sqlx::query_as::<_, EmployeeDetails>(
            r#"
            SELECT e.*,
                   l.name AS location_name,
                   (SELECT COUNT(*) FROM borrowing_requests r WHERE r.employee_id = e.id) AS requests_handled,
                   (SELECT COUNT(*) FROM borrowing_transactions t WHERE t.processed_by = e.id) AS transactions_processed
            FROM employees e
            LEFT JOIN locations l ON l.id = e.location_id
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
    }

    /// Create employee
    pub async fn employees_create(&self, data: &CreateEmployee) -> AppResult<Employee> {
        let row = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                employee_number, first_name, last_name, email, phone,
                position, department, location_id, status, hire_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.employee_number.trim())
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(data.email.as_deref().map(str::trim))
        .bind(&data.phone)
        .bind(&data.position)
        .bind(&data.department)
        .bind(data.location_id)
        .bind(data.status.unwrap_or_default())
        .bind(data.hire_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of an employee
    pub async fn employees_update(&self, id: i32, data: &UpdateEmployee) -> AppResult<Employee> {
        let mut qb = QueryBuilder::new("UPDATE employees SET updated_at = NOW()");
        set(&mut qb, "employee_number", data.employee_number.as_deref().map(str::trim));
        set(&mut qb, "first_name", data.first_name.as_deref().map(str::trim));
        set(&mut qb, "last_name", data.last_name.as_deref().map(str::trim));
        set(&mut qb, "email", data.email.as_deref().map(str::trim));
        set(&mut qb, "phone", data.phone.as_deref());
        set(&mut qb, "position", data.position.as_deref());
        set(&mut qb, "department", data.department.as_deref());
        set(&mut qb, "location_id", data.location_id);
        set(&mut qb, "status", data.status);
        set(&mut qb, "hire_date", data.hire_date);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
    }
}
