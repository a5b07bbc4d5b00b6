//! Item type domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::item_type::{CreateItemType, ItemType, ItemTypeDetails, ItemTypeQuery, UpdateItemType},
};

pub const ITEM_TYPE_REFERENCES: &[Reference] = &[
    Reference { table: "materials", column: "item_type_id", label: "material(s)" },
    Reference { table: "borrowing_items", column: "item_type_id", label: "borrowing item(s)" },
];

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &ItemTypeQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["name", "description"], query.search.as_deref());
    c.eq("status", query.status);
    c.eq("category_id", query.category_id);
}

impl Repository {
    /// List item types with filters, sorting and pagination
    pub async fn item_types_list(
        &self,
        query: &ItemTypeQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ItemType>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM item_types");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM item_types");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<ItemType>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every item type, for export
    pub async fn item_types_all(&self) -> AppResult<Vec<ItemType>> {
        let rows = sqlx::query_as::<_, ItemType>("SELECT * FROM item_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get item type by ID with its category name and usage counts
    pub async fn item_types_get(&self, id: i32) -> AppResult<ItemTypeDetails> {
        sqlx::query_as::<_, ItemTypeDetails>(
            r#"
            SELECT t.*,
                   c.name AS category_name,
                   (SELECT COUNT(*) FROM materials m WHERE m.item_type_id = t.id) AS material_count,
                   (SELECT COUNT(*) FROM borrowing_items bi WHERE bi.item_type_id = t.id) AS borrowing_item_count
            FROM item_types t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item type {} not found", id)))
    }

    /// Create item type
    pub async fn item_types_create(&self, data: &CreateItemType) -> AppResult<ItemType> {
        let row = sqlx::query_as::<_, ItemType>(
            r#"
            INSERT INTO item_types (name, description, category_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of an item type
    pub async fn item_types_update(&self, id: i32, data: &UpdateItemType) -> AppResult<ItemType> {
        let mut qb = QueryBuilder::new("UPDATE item_types SET updated_at = NOW()");
        set(&mut qb, "name", data.name.as_deref().map(str::trim));
        set(&mut qb, "description", data.description.as_deref());
        set(&mut qb, "category_id", data.category_id);
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<ItemType>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item type {} not found", id)))
    }
}
