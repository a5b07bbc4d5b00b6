//! Material domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::material::{CreateMaterial, Material, MaterialDetails, MaterialQuery, UpdateMaterial},
};

pub const MATERIAL_REFERENCES: &[Reference] = &[Reference {
    table: "borrowing_items",
    column: "material_id",
    label: "borrowing item(s)",
}];

/// Materials joined with their reference names. Filters and sort keys
/// apply to the columns of this derived table.
const MATERIAL_DETAILS: &str = r#"
    (
        SELECT m.*,
               c.name AS category_name,
               t.name AS item_type_name,
               l.name AS location_name,
               (m.quantity <= m.min_quantity) AS low_stock
        FROM materials m
        LEFT JOIN categories c ON c.id = m.category_id
        LEFT JOIN item_types t ON t.id = m.item_type_id
        LEFT JOIN locations l ON l.id = m.location_id
    ) AS md"#;

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &MaterialQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["code", "name", "description"], query.search.as_deref());
    c.eq("status", query.status);
    c.eq("category_id", query.category_id);
    c.eq("item_type_id", query.item_type_id);
    c.eq("location_id", query.location_id);
    c.eq("low_stock", query.low_stock);
}

impl Repository {
    /// List materials with reference names, filters, sorting and pagination
    pub async fn materials_list(
        &self,
        query: &MaterialQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<MaterialDetails>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM ");
        count.push(MATERIAL_DETAILS);
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM ");
        select.push(MATERIAL_DETAILS);
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select
            .build_query_as::<MaterialDetails>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Every material, for export
    pub async fn materials_all(&self) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get material by ID with reference names
    pub async fn materials_get(&self, id: i32) -> AppResult<MaterialDetails> {
        let mut qb = QueryBuilder::new("SELECT * FROM ");
        qb.push(MATERIAL_DETAILS).push(" WHERE id = ").push_bind(id);
        qb.build_query_as::<MaterialDetails>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }

    /// Create material
    pub async fn materials_create(&self, data: &CreateMaterial) -> AppResult<Material> {
        let row = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (
                code, name, description, category_id, item_type_id, location_id,
                unit, quantity, min_quantity, unit_price, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(data.code.trim())
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.item_type_id)
        .bind(data.location_id)
        .bind(&data.unit)
        .bind(data.quantity.unwrap_or(0))
        .bind(data.min_quantity.unwrap_or(0))
        .bind(data.unit_price)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of a material
    pub async fn materials_update(&self, id: i32, data: &UpdateMaterial) -> AppResult<Material> {
        let mut qb = QueryBuilder::new("UPDATE materials SET updated_at = NOW()");
        set(&mut qb, "code", data.code.as_deref().map(str::trim));
        set(&mut qb, "name", data.name.as_deref().map(str::trim));
        set(&mut qb, "description", data.description.as_deref());
        set(&mut qb, "category_id", data.category_id);
        set(&mut qb, "item_type_id", data.item_type_id);
        set(&mut qb, "location_id", data.location_id);
        set(&mut qb, "unit", data.unit.as_deref());
        set(&mut qb, "quantity", data.quantity);
        set(&mut qb, "min_quantity", data.min_quantity);
        set(&mut qb, "unit_price", data.unit_price);
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Material>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }
}
