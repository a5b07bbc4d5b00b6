//! Depot Server - warehouse administration backend

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use depot_server::{
    api,
    config::{AppConfig, SessionBackend},
    repository::Repository,
    services::{
        sessions::{MemorySessionStore, RedisSessionStore, SessionStore},
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    tracing::info!("Starting Depot Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let store: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let store = RedisSessionStore::new(&config.redis.url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Sessions stored in Redis");
            Arc::new(store)
        }
        SessionBackend::Memory => {
            tracing::warn!("Sessions stored in memory; they are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.session.clone(), store);

    if let Some(bootstrap) = &config.bootstrap {
        if let Some(admin) = services
            .auth
            .bootstrap(bootstrap)
            .await
            .context("Failed to create the initial super-admin")?
        {
            tracing::info!(admin_id = admin.id, username = %admin.username, "Created initial super-admin");
        }
    }

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("depot_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything below requires a resolved session
    let protected = Router::new()
        // Authentication
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/change-password", post(api::auth::change_password))
        // Admins
        .route("/admins", get(api::admins::list_admins).post(api::admins::create_admin))
        .route("/admins/bulk-delete", post(api::admins::bulk_delete_admins))
        .route("/admins/export", get(api::admins::export_admins))
        .route("/admins/import", post(api::admins::import_admins))
        .route(
            "/admins/:id",
            get(api::admins::get_admin)
                .put(api::admins::update_admin)
                .delete(api::admins::delete_admin),
        )
        // Categories
        .route(
            "/categories",
            get(api::categories::list_categories).post(api::categories::create_category),
        )
        .route("/categories/bulk-delete", post(api::categories::bulk_delete_categories))
        .route("/categories/export", get(api::categories::export_categories))
        .route("/categories/import", post(api::categories::import_categories))
        .route(
            "/categories/:id",
            get(api::categories::get_category)
                .put(api::categories::update_category)
                .delete(api::categories::delete_category),
        )
        // Locations
        .route(
            "/locations",
            get(api::locations::list_locations).post(api::locations::create_location),
        )
        .route("/locations/bulk-delete", post(api::locations::bulk_delete_locations))
        .route("/locations/export", get(api::locations::export_locations))
        .route("/locations/import", post(api::locations::import_locations))
        .route(
            "/locations/:id",
            get(api::locations::get_location)
                .put(api::locations::update_location)
                .delete(api::locations::delete_location),
        )
        // Item types
        .route(
            "/item-types",
            get(api::item_types::list_item_types).post(api::item_types::create_item_type),
        )
        .route("/item-types/bulk-delete", post(api::item_types::bulk_delete_item_types))
        .route("/item-types/export", get(api::item_types::export_item_types))
        .route("/item-types/import", post(api::item_types::import_item_types))
        .route(
            "/item-types/:id",
            get(api::item_types::get_item_type)
                .put(api::item_types::update_item_type)
                .delete(api::item_types::delete_item_type),
        )
        // Customers
        .route(
            "/customers",
            get(api::customers::list_customers).post(api::customers::create_customer),
        )
        .route("/customers/bulk-delete", post(api::customers::bulk_delete_customers))
        .route("/customers/export", get(api::customers::export_customers))
        .route("/customers/import", post(api::customers::import_customers))
        .route(
            "/customers/:id",
            get(api::customers::get_customer)
                .put(api::customers::update_customer)
                .delete(api::customers::delete_customer),
        )
        // Employees
        .route(
            "/employees",
            get(api::employees::list_employees).post(api::employees::create_employee),
        )
        .route("/employees/bulk-delete", post(api::employees::bulk_delete_employees))
        .route("/employees/export", get(api::employees::export_employees))
        .route("/employees/import", post(api::employees::import_employees))
        .route(
            "/employees/:id",
            get(api::employees::get_employee)
                .put(api::employees::update_employee)
                .delete(api::employees::delete_employee),
        )
        // Materials
        .route(
            "/materials",
            get(api::materials::list_materials).post(api::materials::create_material),
        )
        .route("/materials/bulk-delete", post(api::materials::bulk_delete_materials))
        .route("/materials/export", get(api::materials::export_materials))
        .route("/materials/import", post(api::materials::import_materials))
        .route(
            "/materials/:id",
            get(api::materials::get_material)
                .put(api::materials::update_material)
                .delete(api::materials::delete_material),
        )
        // Borrowing requests
        .route(
            "/borrowing-requests",
            get(api::borrowing_requests::list_requests).post(api::borrowing_requests::create_request),
        )
        .route("/borrowing-requests/bulk-delete", post(api::borrowing_requests::bulk_delete_requests))
        .route("/borrowing-requests/export", get(api::borrowing_requests::export_requests))
        .route("/borrowing-requests/mark-overdue", post(api::borrowing_requests::mark_overdue))
        .route(
            "/borrowing-requests/:id",
            get(api::borrowing_requests::get_request)
                .put(api::borrowing_requests::update_request)
                .delete(api::borrowing_requests::delete_request),
        )
        .route("/borrowing-requests/:id/approve", post(api::borrowing_requests::approve_request))
        .route("/borrowing-requests/:id/reject", post(api::borrowing_requests::reject_request))
        // Borrowing items
        .route(
            "/borrowing-items",
            get(api::borrowing_items::list_items).post(api::borrowing_items::create_item),
        )
        .route("/borrowing-items/bulk-delete", post(api::borrowing_items::bulk_delete_items))
        .route(
            "/borrowing-items/:id",
            get(api::borrowing_items::get_item)
                .put(api::borrowing_items::update_item)
                .delete(api::borrowing_items::delete_item),
        )
        // Transactions
        .route(
            "/transactions",
            get(api::transactions::list_transactions).post(api::transactions::create_transaction),
        )
        .route("/transactions/:id", get(api::transactions::get_transaction))
        .route(
            "/return-items",
            get(api::return_items::list_return_items).post(api::return_items::create_return_item),
        )
        .route("/return-items/:id", get(api::return_items::get_return_item))
        .route(
            "/damage-reports",
            get(api::damage_reports::list_damage_reports)
                .post(api::damage_reports::create_damage_report),
        )
        .route("/damage-reports/:id", get(api::damage_reports::get_damage_report))
        // Activity
        .route("/activity-logs", get(api::activity::list_activity))
        .route_layer(middleware::from_fn_with_state(state.clone(), api::auth_gate));

    let api_v1 = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .route("/auth/login", post(api::auth::login))
        .merge(protected)
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
