//! Audit trail of admin actions

use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityLog, ActivityQuery},
        AuthContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Append an entry for `actor`. Failures are logged and never reach the caller.
    pub async fn record(
        &self,
        actor: &AuthContext,
        action: &str,
        entity_type: &str,
        entity_id: Option<i32>,
        details: Option<Value>,
    ) {
        if let Err(e) = self
            .repository
            .activity_insert(Some(actor.admin_id), action, entity_type, entity_id, details.as_ref())
            .await
        {
            tracing::warn!(
                admin_id = actor.admin_id,
                action,
                entity_type,
                ?entity_id,
                "Failed to write activity log: {}",
                e
            );
        }
    }

    /// List activity entries, newest first
    pub async fn list(
        &self,
        query: &ActivityQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ActivityLog>, i64)> {
        self.repository.activity_list(query, per_page, offset).await
    }
}
