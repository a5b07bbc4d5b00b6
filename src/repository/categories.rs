//! Category domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_order_and_page, set, Conditions},
    Reference, Repository,
};
use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryDetails, CategoryQuery, CreateCategory, UpdateCategory},
};

pub const CATEGORY_REFERENCES: &[Reference] = &[
    Reference { table: "materials", column: "category_id", label: "material(s)" },
    Reference { table: "item_types", column: "category_id", label: "item type(s)" },
];

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &CategoryQuery) {
    let mut c = Conditions::new(qb);
    c.search(&["name", "description"], query.search.as_deref());
    c.eq("status", query.status);
}

impl Repository {
    /// List categories with filters, sorting and pagination
    pub async fn categories_list(
        &self,
        query: &CategoryQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Category>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM categories");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM categories");
        push_filters(&mut select, query);
        push_order_and_page(
            &mut select,
            query.sort_by.unwrap_or_default(),
            query.sort_dir.unwrap_or_default(),
            "id",
            per_page,
            offset,
        );
        let rows = select.build_query_as::<Category>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Every category, for export
    pub async fn categories_all(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get category by ID with material and item type counts
    pub async fn categories_get(&self, id: i32) -> AppResult<CategoryDetails> {
        sqlx::query_as::<_, CategoryDetails>(
            r#"
            SELECT c.*,
                   (SELECT COUNT(*) FROM materials m WHERE m.category_id = c.id) AS material_count,
                   (SELECT COUNT(*) FROM item_types t WHERE t.category_id = c.id) AS item_type_count
            FROM categories c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Create category
    pub async fn categories_create(&self, data: &CreateCategory) -> AppResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the provided fields of a category
    pub async fn categories_update(&self, id: i32, data: &UpdateCategory) -> AppResult<Category> {
        let mut qb = QueryBuilder::new("UPDATE categories SET updated_at = NOW()");
        set(&mut qb, "name", data.name.as_deref().map(str::trim));
        set(&mut qb, "description", data.description.as_deref());
        set(&mut qb, "status", data.status);
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }
}
