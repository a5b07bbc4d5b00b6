//! Activity log methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{
    query::{push_page, Conditions},
    Repository,
};
use crate::{
    error::AppResult,
    models::activity::{ActivityLog, ActivityQuery},
};

const ACTIVITY_ROWS: &str = r#"
    SELECT l.id, l.admin_id, a.username AS admin_username, l.action,
           l.entity_type, l.entity_id, l.details, l.created_at
    FROM activity_logs l
    LEFT JOIN admins a ON a.id = l.admin_id"#;

fn push_filters<'args>(qb: &mut QueryBuilder<'args, Postgres>, query: &ActivityQuery) {
    let mut c = Conditions::new(qb);
    c.eq("l.admin_id", query.admin_id);
    c.eq_ci("l.entity_type", query.entity_type.as_deref());
    c.eq("l.entity_id", query.entity_id);
    c.eq_ci("l.action", query.action.as_deref());
}

impl Repository {
    /// Append an entry to the activity log
    pub async fn activity_insert(
        &self,
        admin_id: Option<i32>,
        action: &str,
        entity_type: &str,
        entity_id: Option<i32>,
        details: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (admin_id, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(admin_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List activity entries, newest first
    pub async fn activity_list(
        &self,
        query: &ActivityQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ActivityLog>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM activity_logs l");
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(ACTIVITY_ROWS);
        push_filters(&mut select, query);
        select.push(" ORDER BY l.created_at DESC, l.id DESC");
        push_page(&mut select, per_page, offset);
        let rows = select.build_query_as::<ActivityLog>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }
}
