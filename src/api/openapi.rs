//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    activity, admins, auth, borrowing_items, borrowing_requests, categories, customers,
    damage_reports, employees, health, item_types, locations, materials, return_items,
    transactions,
};
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Depot API",
        version = "1.0.0",
        description = "Warehouse inventory and equipment borrowing REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        auth::change_password,
        // Admins
        admins::list_admins,
        admins::get_admin,
        admins::create_admin,
        admins::update_admin,
        admins::delete_admin,
        admins::bulk_delete_admins,
        admins::export_admins,
        admins::import_admins,
        // Reference data
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::bulk_delete_categories,
        categories::export_categories,
        categories::import_categories,
        locations::list_locations,
        locations::get_location,
        locations::create_location,
        locations::update_location,
        locations::delete_location,
        locations::bulk_delete_locations,
        locations::export_locations,
        locations::import_locations,
        item_types::list_item_types,
        item_types::get_item_type,
        item_types::create_item_type,
        item_types::update_item_type,
        item_types::delete_item_type,
        item_types::bulk_delete_item_types,
        item_types::export_item_types,
        item_types::import_item_types,
        // People
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        customers::bulk_delete_customers,
        customers::export_customers,
        customers::import_customers,
        employees::list_employees,
        employees::get_employee,
        employees::create_employee,
        employees::update_employee,
        employees::delete_employee,
        employees::bulk_delete_employees,
        employees::export_employees,
        employees::import_employees,
        // Materials
        materials::list_materials,
        materials::get_material,
        materials::create_material,
        materials::update_material,
        materials::delete_material,
        materials::bulk_delete_materials,
        materials::export_materials,
        materials::import_materials,
        // Borrowing
        borrowing_requests::list_requests,
        borrowing_requests::get_request,
        borrowing_requests::create_request,
        borrowing_requests::update_request,
        borrowing_requests::delete_request,
        borrowing_requests::bulk_delete_requests,
        borrowing_requests::approve_request,
        borrowing_requests::reject_request,
        borrowing_requests::mark_overdue,
        borrowing_requests::export_requests,
        borrowing_items::list_items,
        borrowing_items::get_item,
        borrowing_items::create_item,
        borrowing_items::update_item,
        borrowing_items::delete_item,
        borrowing_items::bulk_delete_items,
        // Transactions
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::create_transaction,
        return_items::list_return_items,
        return_items::get_return_item,
        return_items::create_return_item,
        damage_reports::list_damage_reports,
        damage_reports::get_damage_report,
        damage_reports::create_damage_report,
        // Activity
        activity::list_activity,
    ),
    components(
        schemas(
            // Auth
            models::auth::AdminRole,
            models::auth::Permission,
            models::auth::LoginRequest,
            models::auth::LoginResponse,
            models::auth::MeResponse,
            models::admin::ChangePassword,
            // Admins
            models::admin::Admin,
            models::admin::AdminDetails,
            models::admin::AdminSort,
            models::admin::CreateAdmin,
            models::admin::UpdateAdmin,
            // Reference data
            models::category::Category,
            models::category::CategoryDetails,
            models::category::CategorySort,
            models::category::CreateCategory,
            models::category::UpdateCategory,
            models::location::Location,
            models::location::LocationDetails,
            models::location::LocationSort,
            models::location::CreateLocation,
            models::location::UpdateLocation,
            models::item_type::ItemType,
            models::item_type::ItemTypeDetails,
            models::item_type::ItemTypeSort,
            models::item_type::CreateItemType,
            models::item_type::UpdateItemType,
            // People
            models::customer::Customer,
            models::customer::CustomerDetails,
            models::customer::CustomerSort,
            models::customer::CreateCustomer,
            models::customer::UpdateCustomer,
            models::employee::Employee,
            models::employee::EmployeeDetails,
            models::employee::EmployeeSort,
            models::employee::CreateEmployee,
            models::employee::UpdateEmployee,
            // Materials
            models::material::Material,
            models::material::MaterialDetails,
            models::material::MaterialSort,
            models::material::CreateMaterial,
            models::material::UpdateMaterial,
            // Borrowing
            models::borrowing::BorrowingStatus,
            models::borrowing::BorrowingRequest,
            models::borrowing::BorrowingRequestSummary,
            models::borrowing::BorrowingRequestDetails,
            models::borrowing::BorrowingRequestSort,
            models::borrowing::BorrowingItemInput,
            models::borrowing::CreateBorrowingRequest,
            models::borrowing::UpdateBorrowingRequest,
            models::borrowing::ItemApproval,
            models::borrowing::ApproveBorrowingRequest,
            models::borrowing::RejectBorrowingRequest,
            models::borrowing::BorrowingItem,
            models::borrowing::CreateBorrowingItem,
            models::borrowing::UpdateBorrowingItem,
            models::borrowing::OverdueSweep,
            // Transactions
            models::transaction::TransactionType,
            models::transaction::ItemCondition,
            models::transaction::BorrowingTransaction,
            models::transaction::BorrowingTransactionDetails,
            models::transaction::TransactionLine,
            models::transaction::CreateTransaction,
            models::transaction::ReturnItem,
            models::transaction::CreateReturnItem,
            models::transaction::DamageReport,
            models::transaction::CreateDamageReport,
            // Activity
            models::activity::ActivityLog,
            // Import / export
            models::enums::RecordStatus,
            models::enums::SortDirection,
            models::transfer::BulkDeleteRequest,
            models::transfer::BulkDeleteResult,
            models::transfer::ExportFormat,
            models::transfer::ImportRowError,
            models::transfer::ImportReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, logout and password"),
        (name = "admins", description = "Admin accounts"),
        (name = "categories", description = "Material categories"),
        (name = "locations", description = "Warehouses and storage locations"),
        (name = "item-types", description = "Item types"),
        (name = "customers", description = "Customers"),
        (name = "employees", description = "Employees"),
        (name = "materials", description = "Material catalog"),
        (name = "borrowing", description = "Borrowing requests and their items"),
        (name = "transactions", description = "Borrows, returns and damage reports"),
        (name = "activity", description = "Audit trail")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Session token returned by /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_paths_and_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/borrowing-requests/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/materials/import"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
