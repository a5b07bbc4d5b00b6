//! Location management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        location::{CreateLocation, Location, LocationDetails, LocationQuery, UpdateLocation},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{locations::LOCATION_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct LocationsService {
    repository: Repository,
    activity: ActivityService,
}

impl LocationsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &LocationQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Location>, i64)> {
        self.repository.locations_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<LocationDetails> {
        self.repository.locations_get(id).await
    }

    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self
            .repository
            .value_taken("locations", "name", name.trim(), exclude_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Location '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateLocation) -> AppResult<Location> {
        data.validate()?;
        self.ensure_name_free(&data.name, None).await?;
        self.repository.locations_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateLocation) -> AppResult<Location> {
        let location = self.insert(&data).await?;
        self.activity
            .record(actor, "create", "location", Some(location.id), Some(json!({ "name": location.name })))
            .await;
        Ok(location)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateLocation,
    ) -> AppResult<Location> {
        data.validate()?;
        if let Some(ref name) = data.name {
            self.ensure_name_free(name, Some(id)).await?;
        }
        let location = self.repository.locations_update(id, &data).await?;
        self.activity
            .record(actor, "update", "location", Some(id), Some(json!({ "name": location.name })))
            .await;
        Ok(location)
    }

    /// Delete one or more unreferenced locations, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("locations", "Location", LOCATION_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "location", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<Location>> {
        self.repository.locations_all().await
    }

    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateLocation| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "location", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
