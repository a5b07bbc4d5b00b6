//! Location domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::location::{CreateLocation, Location, LocationDetails, LocationQuery, UpdateLocation},
};

pub const LOCATION_REFERENCES: &[Reference] = &[
    Reference { table: "materials", column: "location_id", label: "material(s)" },
    Reference { table: "employees", column: "location_id", label: "employee(s)" },
    Reference { table: "borrowing_requests", column: "location_id", label: "borrowing request(s)" },
];

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &LocationQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["name", "address"], query.search.as_deref());
    c.eq("status", query.status);
    c.eq_ci("location_type", query.location_type.as_deref());
}

impl Repository {
    /// List locations with filters, sorting and pagination
    pub async fn locations_list(
        &self,
        query: &LocationQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Location>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM locations");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM locations");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<Location>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every location, for export
    pub async fn locations_all(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get location by ID with employee and material counts
    pub async fn locations_get(&self, id: i32) -> AppResult<LocationDetails> {
        sqlx::query_as::<_, LocationDetails>(
            r#"
            SELECT l.*,
                   (SELECT COUNT(*) FROM employees e WHERE e.location_id = l.id) AS employee_count,
                   (SELECT COUNT(*) FROM materials m WHERE m.location_id = l.id) AS material_count
            FROM locations l
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))
    }

    /// Create location
    pub async fn locations_create(&self, data: &CreateLocation) -> AppResult<Location> {
        let row = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, address, location_type, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.address)
        .bind(&data.location_type)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of a location
    pub async fn locations_update(&self, id: i32, data: &UpdateLocation) -> AppResult<Location> {
        let mut qb = QueryBuilder::new("UPDATE locations SET updated_at = NOW()");
        set(&mut qb, "name", data.name.as_deref().map(str::trim));
        set(&mut qb, "address", data.address.as_deref());
        set(&mut qb, "location_type", data.location_type.as_deref());
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Location>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))
    }
}
