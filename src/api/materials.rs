//! Material (stock) endpoints

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
        material::{CreateMaterial, Material, MaterialDetails, MaterialQuery, UpdateMaterial},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List materials with filters, sorting and pagination.
///
/// Rows carry category, item type and location names and a `low_stock`
/// flag (quantity at or below the minimum), which is also filterable.
#[utoipa::path(
    get,
    path = "/materials",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(MaterialQuery),
    responses(
        (status = 200, description = "List of materials", body = PaginatedResponse<MaterialDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_materials(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<MaterialQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<MaterialDetails>>>> {
    ctx.require(Permission::ViewMaterials)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.materials.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get material details by ID
#[utoipa::path(
    get,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material details", body = MaterialDetails),
        (status = 404, description = "Material not found")
    )
)]
pub async fn get_material(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<MaterialDetails>>> {
    ctx.require(Permission::ViewMaterials)?;

    let details = state.services.materials.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new material
#[utoipa::path(
    post,
    path = "/materials",
    tag = "materials",
    security(("bearer_auth" = [])),
    request_body = CreateMaterial,
    responses(
        (status = 200, description = "Material created", body = Material),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Material code already exists")
    )
)]
pub async fn create_material(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateMaterial>,
) -> AppResult<Json<ApiResponse<Material>>> {
    ctx.require(Permission::ManageMaterials)?;

    let created = state.services.materials.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Material created"))
}

/// Update an existing material
#[utoipa::path(
    put,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Material ID")),
    request_body = UpdateMaterial,
    responses(
        (status = 200, description = "Material updated", body = Material),
        (status = 404, description = "Material not found"),
        (status = 409, description = "Material code already exists")
    )
)]
pub async fn update_material(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateMaterial>,
) -> AppResult<Json<ApiResponse<Material>>> {
    ctx.require(Permission::ManageMaterials)?;

    let updated = state.services.materials.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Material updated"))
}

/// Delete a material
#[utoipa::path(
    delete,
    path = "/materials/{id}",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material deleted", body = BulkDeleteResult),
        (status = 404, description = "Material not found"),
        (status = 409, description = "Material is still referenced")
    )
)]
pub async fn delete_material(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageMaterials)?;

    let deleted = state.services.materials.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Material deleted"))
}

/// Delete several materials in one transaction
#[utoipa::path(
    post,
    path = "/materials/bulk-delete",
    tag = "materials",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Materials deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the materials does not exist"),
        (status = 409, description = "One of the materials is still referenced")
    )
)]
pub async fn bulk_delete_materials(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageMaterials)?;

    let deleted = state.services.materials.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} materials deleted", deleted),
    ))
}

/// Export all materials as CSV or JSON
#[utoipa::path(
    get,
    path = "/materials/export",
    tag = "materials",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_materials(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewMaterials)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.materials.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "materials")
}

/// Import materials from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/materials/import",
    tag = "materials",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_materials(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageMaterials)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.materials.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
