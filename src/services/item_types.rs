//! Item type management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        item_type::{CreateItemType, ItemType, ItemTypeDetails, ItemTypeQuery, UpdateItemType},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{item_types::ITEM_TYPE_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct ItemTypesService {
    repository: Repository,
    activity: ActivityService,
}

impl ItemTypesService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &ItemTypeQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<ItemType>, i64)> {
        self.repository.item_types_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<ItemTypeDetails> {
        self.repository.item_types_get(id).await
    }

    async fn check(&self, name: Option<&str>, category_id: Option<i32>, id: Option<i32>) -> AppResult<()> {
        if let Some(name) = name {
            if self
                .repository
                .value_taken("item_types", "name", name.trim(), id)
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "Item type '{}' already exists",
                    name.trim()
                )));
            }
        }
        if let Some(category_id) = category_id {
            self.repository
                .ensure_active("categories", "Category", category_id)
                .await?;
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateItemType) -> AppResult<ItemType> {
        data.validate()?;
        self.check(Some(&data.name), data.category_id, None).await?;
        self.repository.item_types_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateItemType) -> AppResult<ItemType> {
        let item_type = self.insert(&data).await?;
        self.activity
            .record(actor, "create", "item_type", Some(item_type.id), Some(json!({ "name": item_type.name })))
            .await;
        Ok(item_type)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateItemType,
    ) -> AppResult<ItemType> {
        data.validate()?;
        self.check(data.name.as_deref(), data.category_id, Some(id)).await?;
        let item_type = self.repository.item_types_update(id, &data).await?;
        self.activity
            .record(actor, "update", "item_type", Some(id), Some(json!({ "name": item_type.name })))
            .await;
        Ok(item_type)
    }

    /// Delete one or more unreferenced item types, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("item_types", "Item type", ITEM_TYPE_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "item_type", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<ItemType>> {
        self.repository.item_types_all().await
    }

    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateItemType| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "item_type", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
