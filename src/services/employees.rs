//! Employee management service

use serde_json::json;
use validator::Validate;

use super::{activity::ActivityService, import_rows, normalize_ids, sole_id};
use crate::{
    error::{AppError, AppResult},
    models::{
        employee::{CreateEmployee, Employee, EmployeeDetails, EmployeeQuery, UpdateEmployee},
        transfer::ImportReport,
        AuthContext,
    },
    repository::{employees::EMPLOYEE_REFERENCES, Repository},
};

#[derive(Clone)]
pub struct EmployeesService {
    repository: Repository,
    activity: ActivityService,
}

impl EmployeesService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn list(
        &self,
        query: &EmployeeQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<Employee>, i64)> {
        self.repository.employees_list(query, per_page, offset).await
    }

    pub async fn get(&self, id: i32) -> AppResult<EmployeeDetails> {
        self.repository.employees_get(id).await
    }

    /// Unique employee number and email, existing active location
    async fn check(
        &self,
        employee_number: Option<&str>,
        email: Option<&str>,
        location_id: Option<i32>,
        id: Option<i32>,
    ) -> AppResult<()> {
        if let Some(number) = employee_number.map(str::trim) {
            if self
                .repository
                .value_taken("employees", "employee_number", number, id)
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "Employee number '{}' is already assigned",
                    number
                )));
            }
        }
        if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
            if self.repository.value_taken("employees", "email", email, id).await? {
                return Err(AppError::Conflict(format!(
                    "An employee with email '{}' already exists",
                    email
                )));
            }
        }
        if let Some(location_id) = location_id {
            self.repository
                .ensure_active("locations", "Location", location_id)
                .await?;
        }
        Ok(())
    }

    async fn insert(&self, data: &CreateEmployee) -> AppResult<Employee> {
        data.validate()?;
        self.check(
            Some(&data.employee_number),
            data.email.as_deref(),
            data.location_id,
            None,
        )
        .await?;
        self.repository.employees_create(data).await
    }

    pub async fn create(&self, actor: &AuthContext, data: CreateEmployee) -> AppResult<Employee> {
        let employee = self.insert(&data).await?;
        self.activity
            .record(
                actor,
                "create",
                "employee",
                Some(employee.id),
                Some(json!({ "employee_number": employee.employee_number })),
            )
            .await;
        Ok(employee)
    }

    pub async fn update(
        &self,
        actor: &AuthContext,
        id: i32,
        data: UpdateEmployee,
    ) -> AppResult<Employee> {
        data.validate()?;
        self.check(
            data.employee_number.as_deref(),
            data.email.as_deref(),
            data.location_id,
            Some(id),
        )
        .await?;
        let employee = self.repository.employees_update(id, &data).await?;
        self.activity
            .record(
                actor,
                "update",
                "employee",
                Some(id),
                Some(json!({ "employee_number": employee.employee_number })),
            )
            .await;
        Ok(employee)
    }

    /// Delete one or more employees without borrowing history, all or nothing
    pub async fn delete(&self, actor: &AuthContext, ids: &[i32]) -> AppResult<u64> {
        let ids = normalize_ids(ids)?;
        let deleted = self
            .repository
            .delete_unreferenced("employees", "Employee", EMPLOYEE_REFERENCES, &ids)
            .await?;
        self.activity
            .record(actor, "delete", "employee", sole_id(&ids), Some(json!({ "ids": ids })))
            .await;
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<Employee>> {
        self.repository.employees_all().await
    }

    pub async fn import(&self, actor: &AuthContext, content: &[u8]) -> AppResult<ImportReport> {
        let report = import_rows(content, |data: CreateEmployee| async move {
            self.insert(&data).await.map(|_| ())
        })
        .await?;
        self.activity
            .record(actor, "import", "employee", None, Some(json!(report)))
            .await;
        Ok(report)
    }
}
