//! Customer endpoints

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
        customer::{CreateCustomer, Customer, CustomerDetails, CustomerQuery, UpdateCustomer},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List customers with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(CustomerQuery),
    responses(
        (status = 200, description = "List of customers", body = PaginatedResponse<Customer>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_customers(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<CustomerQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Customer>>>> {
    ctx.require(Permission::ViewCustomers)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.customers.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get customer details by ID
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer details", body = CustomerDetails),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<CustomerDetails>>> {
    ctx.require(Permission::ViewCustomers)?;

    let details = state.services.customers.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new customer
#[utoipa::path(
    post,
    path = "/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = CreateCustomer,
    responses(
        (status = 200, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_customer(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateCustomer>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    ctx.require(Permission::ManageCustomers)?;

    let created = state.services.customers.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Customer created"))
}

/// Update an existing customer
#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomer,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_customer(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateCustomer>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    ctx.require(Permission::ManageCustomers)?;

    let updated = state.services.customers.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Customer updated"))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer deleted", body = BulkDeleteResult),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer is still referenced")
    )
)]
pub async fn delete_customer(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageCustomers)?;

    let deleted = state.services.customers.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Customer deleted"))
}

#[utoipa::path(
    post,
    path = "/customers/bulk-delete",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Customers deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the customers does not exist"),
        (status = 409, description = "One of the customers is still referenced")
    )
)]
pub async fn bulk_delete_customers(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageCustomers)?;

    let deleted = state.services.customers.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} customers deleted", deleted),
    ))
}

/// Export all customers as CSV or JSON
#[utoipa::path(
    get,
    path = "/customers/export",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_customers(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewCustomers)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.customers.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "customers")
}

/// Import customers from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/customers/import",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_customers(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageCustomers)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.customers.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
