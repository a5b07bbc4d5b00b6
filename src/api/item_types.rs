//! Item type endpoints

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
        item_type::{CreateItemType, ItemType, ItemTypeDetails, ItemTypeQuery, UpdateItemType},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List item types with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/item-types",
    tag = "item-types",
    security(("bearer_auth" = [])),
    params(ItemTypeQuery),
    responses(
        (status = 200, description = "List of item types", body = PaginatedResponse<ItemType>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_item_types(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ItemTypeQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<ItemType>>>> {
    ctx.require(Permission::ViewItemTypes)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.item_types.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get item type details by ID
#[utoipa::path(
    get,
    path = "/item-types/{id}",
    tag = "item-types",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item type ID")),
    responses(
        (status = 200, description = "Item type details", body = ItemTypeDetails),
        (status = 404, description = "Item type not found")
    )
)]
pub async fn get_item_type(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ItemTypeDetails>>> {
    ctx.require(Permission::ViewItemTypes)?;

    let details = state.services.item_types.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new item type
#[utoipa::path(
    post,
    path = "/item-types",
    tag = "item-types",
    security(("bearer_auth" = [])),
    request_body = CreateItemType,
    responses(
        (status = 200, description = "Item type created", body = ItemType),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Item type name already exists")
    )
)]
pub async fn create_item_type(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateItemType>,
) -> AppResult<Json<ApiResponse<ItemType>>> {
    ctx.require(Permission::ManageItemTypes)?;

    let created = state.services.item_types.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Item type created"))
}

/// Update an existing item type
#[utoipa::path(
    put,
    path = "/item-types/{id}",
    tag = "item-types",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item type ID")),
    request_body = UpdateItemType,
    responses(
        (status = 200, description = "Item type updated", body = ItemType),
        (status = 404, description = "Item type not found"),
        (status = 409, description = "Item type name already exists")
    )
)]
pub async fn update_item_type(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateItemType>,
) -> AppResult<Json<ApiResponse<ItemType>>> {
    ctx.require(Permission::ManageItemTypes)?;

    let updated = state.services.item_types.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Item type updated"))
}

/// Delete an item type
#[utoipa::path(
    delete,
    path = "/item-types/{id}",
    tag = "item-types",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Item type ID")),
    responses(
        (status = 200, description = "Item type deleted", body = BulkDeleteResult),
        (status = 404, description = "Item type not found"),
        (status = 409, description = "Item type is still referenced")
    )
)]
pub async fn delete_item_type(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageItemTypes)?;

    let deleted = state.services.item_types.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Item type deleted"))
}

/// Delete several item types in one transaction
#[utoipa::path(
    post,
    path = "/item-types/bulk-delete",
    tag = "item-types",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Item types deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the item types does not exist"),
        (status = 409, description = "One of the item types is still referenced")
    )
)]
pub async fn bulk_delete_item_types(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageItemTypes)?;

    let deleted = state.services.item_types.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} item types deleted", deleted),
    ))
}

/// Export all item types as CSV or JSON
#[utoipa::path(
    get,
    path = "/item-types/export",
    tag = "item-types",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_item_types(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewItemTypes)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.item_types.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "item_types")
}

/// Import item types from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/item-types/import",
    tag = "item-types",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_item_types(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageItemTypes)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.item_types.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
