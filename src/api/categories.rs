//! Category endpoints

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
        category::{Category, CategoryDetails, CategoryQuery, CreateCategory, UpdateCategory},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List categories with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(CategoryQuery),
    responses(
        (status = 200, description = "List of categories", body = PaginatedResponse<Category>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Category>>>> {
    ctx.require(Permission::ViewCategories)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.categories.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get category details by ID
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = CategoryDetails),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<CategoryDetails>>> {
    ctx.require(Permission::ViewCategories)?;

    let details = state.services.categories.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategory,
    responses(
        (status = 200, description = "Category created", body = Category),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Category name already exists")
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateCategory>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ctx.require(Permission::ManageCategories)?;

    let created = state.services.categories.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Category created"))
}

/// Update an existing category
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category name already exists")
    )
)]
pub async fn update_category(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateCategory>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ctx.require(Permission::ManageCategories)?;

    let updated = state.services.categories.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Category updated"))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = BulkDeleteResult),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category is still referenced")
    )
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageCategories)?;

    let deleted = state.services.categories.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Category deleted"))
}

/// Delete several categories in one transaction
#[utoipa::path(
    post,
    path = "/categories/bulk-delete",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Categories deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the categories does not exist"),
        (status = 409, description = "One of the categories is still referenced")
    )
)]
pub async fn bulk_delete_categories(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageCategories)?;

    let deleted = state.services.categories.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} categories deleted", deleted),
    ))
}

/// Export all categories as CSV or JSON
#[utoipa::path(
    get,
    path = "/categories/export",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_categories(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewCategories)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.categories.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "categories")
}

/// Import categories from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/categories/import",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_categories(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageCategories)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.categories.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
