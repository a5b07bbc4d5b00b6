//! Material (stock) management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        material::{CreateMaterial, Material, MaterialDetails, MaterialQuery, UpdateMaterial},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{materials::MATERIAL_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct MaterialsService {
    repository: Repository,
    activity: ActivityService,
}

/// Reference and uniqueness fields shared by create and update
struct MaterialRefs<'a> {
    code: Option<&'a str>,
    category_id: Option<i32>,
    item_type_id: Option<i32>,
    location_id: Option<i32>,
}

impl MaterialsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &MaterialQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<MaterialDetails>, i64)> {
        self.repository.materials_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<MaterialDetails> {
        self.repository.materials_get(id).await
    }

    async fn check(&self, refs: MaterialRefs<'_>, id: Option<i32>) -> AppResult<()> {
        if let Some(code) = refs.code.map(str::trim) {
            if self.repository.value_taken("materials", "code", code, id).await? {
                return Err(AppError::Conflict(format!(
                    "Material code '{}' already exists",
                    code
                )));
            }
        }
        if let Some(category_id) = refs.category_id {
            self.repository
                .ensure_active("categories", "Category", category_id)
                .await?;
        }
        if let Some(item_type_id) = refs.item_type_id {
            self.repository
                .ensure_active("item_types", "Item type", item_type_id)
                .await?;
        }
        if let Some(location_id) = refs.location_id {
            self.repository
                .ensure_active("locations", "Location", location_id)
                .await?;
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateMaterial) -> AppResult<Material> {
        data.validate()?;
        if data.unit_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(AppError::Validation("unit_price: must not be negative".to_string()));
        }
        self.check(
            MaterialRefs {
                code: Some(&data.code),
                category_id: Some(data.category_id),
                item_type_id: data.item_type_id,
                location_id: data.location_id,
            },
            None,
        )
        .await?;
        self.repository.materials_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateMaterial) -> AppResult<Material> {
        let material = self.insert(&data).await?;
        self.activity
            .record(actor, "create", "material", Some(material.id), Some(json!({ "code": material.code })))
            .await;
        Ok(material)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateMaterial,
    ) -> AppResult<Material> {
        data.validate()?;
        if data.unit_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(AppError::Validation("unit_price: must not be negative".to_string()));
        }
        self.check(
            MaterialRefs {
                code: data.code.as_deref(),
                category_id: data.category_id,
                item_type_id: data.item_type_id,
                location_id: data.location_id,
            },
            Some(id),
        )
        .await?;
        let material = self.repository.materials_update(id, &data).await?;
        self.activity
            .record(actor, "update", "material", Some(id), Some(json!({ "code": material.code })))
            .await;
        Ok(material)
    }

    /// Delete one or more materials never requested, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("materials", "Material", MATERIAL_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "material", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<Material>> {
        self.repository.materials_all().await
    }

    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateMaterial| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "material", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
