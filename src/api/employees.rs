//! Employee endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use axum_extra::extract::Multipart;

use super::{export_response, read_upload, ApiResponse, AppJson, CurrentAdmin, PaginatedResponse};
use crate::{
    error::AppResult,
    models::{
        employee::{CreateEmployee, Employee, EmployeeDetails, EmployeeQuery, UpdateEmployee},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List employees with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/employees",
    tag = "employees",
    security(("bearer_auth" = [])),
    params(EmployeeQuery),
    responses(
        (status = 200, description = "List of employees", body = PaginatedResponse<Employee>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_employees(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Employee>>>> {
    ctx.require(Permission::ViewEmployees)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.employees.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get employee details by ID
#[utoipa::path(
    get,
    path = "/employees/{id}",
    tag = "employees",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee details", body = EmployeeDetails),
        (status = 404, description = "Employee not found")
    )
)]
pub async fn get_employee(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<EmployeeDetails>>> {
    ctx.require(Permission::ViewEmployees)?;

    let details = state.services.employees.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new employee
#[utoipa::path(
    post,
    path = "/employees",
    tag = "employees",
    security(("bearer_auth" = [])),
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Employee number or email already in use")
    )
)]
pub async fn create_employee(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateEmployee>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    ctx.require(Permission::ManageEmployees)?;

    let created = state.services.employees.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Employee created"))
}

/// Update an existing employee
#[utoipa::path(
    put,
    path = "/employees/{id}",
    tag = "employees",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee number or email already in use")
    )
)]
pub async fn update_employee(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateEmployee>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    ctx.require(Permission::ManageEmployees)?;

    let updated = state.services.employees.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Employee updated"))
}

/// Delete a employee
#[utoipa::path(
    delete,
    path = "/employees/{id}",
    tag = "employees",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted", body = BulkDeleteResult),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee is still referenced")
    )
)]
pub async fn delete_employee(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageEmployees)?;

    let deleted = state.services.employees.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Employee deleted"))
}

/// Delete several employees in one transaction
#[utoipa::path(
    post,
    path = "/employees/bulk-delete",
    tag = "employees",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Employees deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the employees does not exist"),
        (status = 409, description = "One of the employees is still referenced")
    )
)]
pub async fn bulk_delete_employees(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageEmployees)?;

    let deleted = state.services.employees.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} employees deleted", deleted),
    ))
}

/// Export all employees as CSV or JSON
#[utoipa::path(
    get,
    path = "/employees/export",
    tag = "employees",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_employees(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewEmployees)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.employees.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "employees")
}

/// Import employees from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/employees/import",
    tag = "employees",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_employees(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageEmployees)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.employees.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
