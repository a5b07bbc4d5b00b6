//! Admin account endpoints

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
        admin::{Admin, AdminDetails, AdminQuery, CreateAdmin, UpdateAdmin},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List admins with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(AdminQuery),
    responses(
        (status = 200, description = "List of admins", body = PaginatedResponse<Admin>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_admins(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<AdminQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Admin>>>> {
    ctx.require(Permission::ViewAdmins)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.admins.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get admin details by ID
#[utoipa::path(
    get,
    path = "/admins/{id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Admin ID")),
    responses(
        (status = 200, description = "Admin details", body = AdminDetails),
        (status = 404, description = "Admin not found")
    )
)]
pub async fn get_admin(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<AdminDetails>>> {
    ctx.require(Permission::ViewAdmins)?;

    let details = state.services.admins.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new admin
#[utoipa::path(
    post,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    request_body = CreateAdmin,
    responses(
        (status = 200, description = "Admin created", body = Admin),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn create_admin(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateAdmin>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    ctx.require(Permission::ManageAdmins)?;

    let created = state.services.admins.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Admin created"))
}

/// Update an existing admin
#[utoipa::path(
    put,
    path = "/admins/{id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Admin ID")),
    request_body = UpdateAdmin,
    responses(
        (status = 200, description = "Admin updated", body = Admin),
        (status = 404, description = "Admin not found"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn update_admin(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateAdmin>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    ctx.require(Permission::ManageAdmins)?;

    let updated = state.services.admins.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Admin updated"))
}

/// Delete an admin account
#[utoipa::path(
    delete,
    path = "/admins/{id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Admin ID")),
    responses(
        (status = 200, description = "Admin deleted", body = BulkDeleteResult),
        (status = 400, description = "Own account or last active super-admin"),
        (status = 403, description = "Super-admin accounts need super-admin rights"),
        (status = 404, description = "Admin not found")
    )
)]
pub async fn delete_admin(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageAdmins)?;

    let deleted = state.services.admins.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Admin deleted"))
}

/// Delete several admins in one transaction
#[utoipa::path(
    post,
    path = "/admins/bulk-delete",
    tag = "admins",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Admins deleted", body = BulkDeleteResult),
        (status = 400, description = "Own account or last active super-admin"),
        (status = 404, description = "One of the admins does not exist")
    )
)]
pub async fn bulk_delete_admins(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageAdmins)?;

    let deleted = state.services.admins.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} admins deleted", deleted),
    ))
}

/// Export all admins as CSV or JSON. Password hashes are never exported.
#[utoipa::path(
    get,
    path = "/admins/export",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_admins(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewAdmins)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.admins.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "admins")
}

/// Import admins from an uploaded CSV file (multipart field `file`).
/// Every row needs a `password`; `permissions` are `;`-separated slugs.
#[utoipa::path(
    post,
    path = "/admins/import",
    tag = "admins",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_admins(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageAdmins)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.admins.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
