//! Category management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        category::{Category, CategoryDetails, CategoryQuery, CreateCategory, UpdateCategory},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{categories::CATEGORY_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
    activity: ActivityService,
}

impl CategoriesService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &CategoryQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Category>, i64)> {
        self.repository.categories_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<CategoryDetails> {
        self.repository.categories_get(id).await
    }

    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self
            .repository
            .value_taken("categories", "name", name.trim(), exclude_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateCategory) -> AppResult<Category> {
        data.validate()?;
        self.ensure_name_free(&data.name, None).await?;
        self.repository.categories_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateCategory) -> AppResult<Category> {
        let category = self.insert(&data).await?;
        self.activity
            .record(actor, "create", "category", Some(category.id), Some(json!({ "name": category.name })))
            .await;
        Ok(category)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateCategory,
    ) -> AppResult<Category> {
        data.validate()?;
        if let Some(ref name) = data.name {
            self.ensure_name_free(name, Some(id)).await?;
        }
        let category = self.repository.categories_update(id, &data).await?;
        self.activity
            .record(actor, "update", "category", Some(id), Some(json!({ "name": category.name })))
            .await;
        Ok(category)
    }

    /// Delete one or more unreferenced categories, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("categories", "Category", CATEGORY_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "category", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<Category>> {
        self.repository.categories_all().await
    }

    /// Create one category per CSV row, reporting failures per row
    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateCategory| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "category", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
