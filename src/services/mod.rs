//! Business logic services

pub mod activity;
pub mod admins;
pub mod auth;
pub mod borrowing;
pub mod categories;
pub mod customers;
pub mod employees;
pub mod item_types;
pub mod locations;
pub mod materials;
pub mod sessions;
pub mod transactions;
pub mod transfer;

use std::{future::Future, sync::Arc};

use serde::de::DeserializeOwned;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::transfer::ImportReport,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub activity: activity::ActivityService,
    pub admins: admins::AdminsService,
    pub auth: auth::AuthService,
    pub borrowing: borrowing::BorrowingService,
    pub categories: categories::CategoriesService,
    pub customers: customers::CustomersService,
    pub employees: employees::EmployeesService,
    pub item_types: item_types::ItemTypesService,
    pub locations: locations::LocationsService,
    pub materials: materials::MaterialsService,
    pub transactions: transactions::TransactionsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        session_config: SessionConfig,
        store: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        let activity = activity::ActivityService::new(repository.clone());
        let sessions = sessions::SessionManager::new(store, session_config.ttl_minutes);

        Self {
            admins: admins::AdminsService::new(repository.clone(), activity.clone()),
            auth: auth::AuthService::new(repository.clone(), session_config, sessions, activity.clone()),
            borrowing: borrowing::BorrowingService::new(repository.clone(), activity.clone()),
            categories: categories::CategoriesService::new(repository.clone(), activity.clone()),
            customers: customers::CustomersService::new(repository.clone(), activity.clone()),
            employees: employees::EmployeesService::new(repository.clone(), activity.clone()),
            item_types: item_types::ItemTypesService::new(repository.clone(), activity.clone()),
            locations: locations::LocationsService::new(repository.clone(), activity.clone()),
            materials: materials::MaterialsService::new(repository.clone(), activity.clone()),
            transactions: transactions::TransactionsService::new(repository.clone(), activity.clone()),
            activity,
            repository,
        }
    }

    /// Database round-trip for the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

/// Sorted, deduplicated ids of a bulk operation
pub(crate) fn normalize_ids(ids: &[i32]) -> AppResult<Vec<i32>> {
    if ids.is_empty() {
        return Err(AppError::Validation("ids must not be empty".to_string()));
    }
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Entity id to tag an activity entry with; bulk operations carry none
pub(crate) fn sole_id(ids: &[i32]) -> Option<i32> {
    match ids {
        [id] => Some(*id),
        _ => None,
    }
}

/// Decode a CSV upload and hand every valid row to `insert`. Rows that fail
/// to decode or insert are reported and skipped.
pub(crate) async fn import_rows<T, F, Fut>(content: &[u8], mut insert: F) -> AppResult<ImportReport>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let mut report = ImportReport::default();
    for row in transfer::parse_csv::<T>(content)? {
        let outcome = match row.record {
            Ok(record) => insert(record).await.map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => report.record_success(),
            Err(message) => {
                tracing::debug!(row = row.row, "Import row rejected: {}", message);
                report.record_failure(row.row, message)
            }
        }
    }
    tracing::info!(imported = report.imported, failed = report.failed, "CSV import finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::CreateCategory;

    #[test]
    fn test_normalize_ids() {
        assert_eq!(normalize_ids(&[5, 2, 5, 1]).unwrap(), vec![1, 2, 5]);
        assert!(matches!(normalize_ids(&[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_sole_id() {
        assert_eq!(sole_id(&[7]), Some(7));
        assert_eq!(sole_id(&[1, 2]), None);
        assert_eq!(sole_id(&[]), None);
    }

    #[tokio::test]
    async fn test_import_rows_counts_each_outcome() {
        let content = b"name,status\nTools,active\nBad,unknown\nDuplicate,\n";
        let report = import_rows(content, |data: CreateCategory| async move {
            if data.name == "Duplicate" {
                Err(AppError::Conflict("Category 'Duplicate' already exists".to_string()))
            } else {
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[1].row, 3);
        assert!(report.errors[1].message.contains("already exists"));
    }
}
