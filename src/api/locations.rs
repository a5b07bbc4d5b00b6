//! Location endpoints

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
        location::{CreateLocation, Location, LocationDetails, LocationQuery, UpdateLocation},
        transfer::{BulkDeleteRequest, BulkDeleteResult, ExportQuery, ImportReport},
        Permission,
    },
};

/// List locations with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/locations",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(LocationQuery),
    responses(
        (status = 200, description = "List of locations", body = PaginatedResponse<Location>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_locations(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Location>>>> {
    ctx.require(Permission::ViewLocations)?;

    let (page, per_page, offset) = state.config.pagination.resolve(query.page, query.per_page);
    let (items, total) = state.services.locations.list(&query, per_page, offset).await?;

    Ok(ApiResponse::ok(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get location details by ID
#[utoipa::path(
    get,
    path = "/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location details", body = LocationDetails),
        (status = 404, description = "Location not found")
    )
)]
pub async fn get_location(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<LocationDetails>>> {
    ctx.require(Permission::ViewLocations)?;

    let details = state.services.locations.get(id).await?;
    Ok(ApiResponse::ok(details))
}

/// Create a new location
#[utoipa::path(
    post,
    path = "/locations",
    tag = "locations",
    security(("bearer_auth" = [])),
    request_body = CreateLocation,
    responses(
        (status = 200, description = "Location created", body = Location),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Location name already exists")
    )
)]
pub async fn create_location(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(data): AppJson<CreateLocation>,
) -> AppResult<Json<ApiResponse<Location>>> {
    ctx.require(Permission::ManageLocations)?;

    let created = state.services.locations.create(&ctx, data).await?;
    Ok(ApiResponse::with_message(created, "Location created"))
}

/// Update an existing location
#[utoipa::path(
    put,
    path = "/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Location ID")),
    request_body = UpdateLocation,
    responses(
        (status = 200, description = "Location updated", body = Location),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Location name already exists")
    )
)]
pub async fn update_location(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateLocation>,
) -> AppResult<Json<ApiResponse<Location>>> {
    ctx.require(Permission::ManageLocations)?;

    let updated = state.services.locations.update(&ctx, id, data).await?;
    Ok(ApiResponse::with_message(updated, "Location updated"))
}

/// Delete a location
#[utoipa::path(
    delete,
    path = "/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location deleted", body = BulkDeleteResult),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Location is still referenced")
    )
)]
pub async fn delete_location(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageLocations)?;

    let deleted = state.services.locations.delete(&ctx, &[id]).await?;
    Ok(ApiResponse::with_message(BulkDeleteResult { deleted }, "Location deleted"))
}

#[utoipa::path(
    post,
    path = "/locations/bulk-delete",
    tag = "locations",
    security(("bearer_auth" = [])),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Locations deleted", body = BulkDeleteResult),
        (status = 404, description = "One of the locations does not exist"),
        (status = 409, description = "One of the locations is still referenced")
    )
)]
pub async fn bulk_delete_locations(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    AppJson(request): AppJson<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    ctx.require(Permission::ManageLocations)?;

    let deleted = state.services.locations.delete(&ctx, &request.ids).await?;
    Ok(ApiResponse::with_message(
        BulkDeleteResult { deleted },
        format!("{} locations deleted", deleted),
    ))
}

/// Export all locations as CSV or JSON
#[utoipa::path(
    get,
    path = "/locations/export",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "File download", content_type = "text/csv"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn export_locations(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    ctx.require(Permission::ViewLocations)?;
    ctx.require(Permission::ExportData)?;

    let rows = state.services.locations.export().await?;
    export_response(rows, query.format.unwrap_or_default(), "locations")
}

/// Import locations from an uploaded CSV file (multipart field `file`)
#[utoipa::path(
    post,
    path = "/locations/import",
    tag = "locations",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_locations(
    State(state): State<crate::AppState>,
    CurrentAdmin(ctx): CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    ctx.require(Permission::ManageLocations)?;
    ctx.require(Permission::ImportData)?;

    let content = read_upload(multipart).await?;
    let report = state.services.locations.import(&ctx, &content).await?;
    Ok(ApiResponse::ok(report))
}
