//! Customer management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer, CustomerDetails, CustomerQuery, UpdateCustomer},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{customers::CUSTOMER_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
    activity: ActivityService,
}

impl CustomersService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &CustomerQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Customer>, i64)> {
        self.repository.customers_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<CustomerDetails> {
        self.repository.customers_get(id).await
    }

    async fn ensure_email_free(&self, email: Option<&str>, exclude_id: Option<i32>) -> AppResult<()> {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(());
        };
        if self
            .repository
            .value_taken("customers", "email", email, exclude_id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "A customer with email '{}' already exists",
                email
            )));
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateCustomer) -> AppResult<Customer> {
        data.validate()?;
        self.ensure_email_free(data.email.as_deref(), None).await?;
        self.repository.customers_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateCustomer) -> AppResult<Customer> {
        let customer = self.insert(&data).await?;
        self.activity
            .record(actor, "create", "customer", Some(customer.id), Some(json!({ "name": customer.name })))
            .await;
        Ok(customer)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateCustomer,
    ) -> AppResult<Customer> {
        data.validate()?;
        self.ensure_email_free(data.email.as_deref(), Some(id)).await?;
        let customer = self.repository.customers_update(id, &data).await?;
        self.activity
            .record(actor, "update", "customer", Some(id), Some(json!({ "name": customer.name })))
            .await;
        Ok(customer)
    }

    /// Delete one or more customers without borrowing history, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("customers", "Customer", CUSTOMER_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "customer", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<Customer>> {
        self.repository.customers_all().await
    }

    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateCustomer| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "customer", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
