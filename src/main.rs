//! Bookflix Server - Library Lending & Reservation System
//!
//! REST API server for the Bookflix lending engine.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookflix_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookflix_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookflix Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.lending.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", delete(api::books::delete_book))
        .route("/books/:id/stock", put(api::books::set_stock_level))
        .route("/books/:id/reservations", get(api::reservations::get_book_queue))
        // Copies
        .route("/copies/:id/status", put(api::books::update_copy_status))
        // Borrowings
        .route("/borrowings", post(api::borrowings::borrow))
        .route("/borrowings/:id/renew", post(api::borrowings::renew))
        .route("/borrowings/:id/return", post(api::borrowings::return_loan))
        // Reservations
        .route("/reservations", post(api::reservations::reserve))
        .route("/reservations/:id/ready", post(api::reservations::mark_ready))
        .route("/reservations/:id/complete", post(api::reservations::complete))
        .route("/reservations/:id/cancel", post(api::reservations::cancel))
        // Members
        .route("/members/:id/borrowings", get(api::members::get_member_borrowings))
        .route("/members/:id/reservations", get(api::members::get_member_reservations))
        .route("/members/:id/fines", get(api::members::get_member_fines))
        .route("/members/:id/notifications", get(api::members::get_member_notifications))
        // Fines
        .route("/fines/:id/waive", post(api::fines::waive))
        .route("/fines/:id/paid", post(api::fines::mark_paid))
        // Sweeps (cron-triggered)
        .route("/sweeps/fines", post(api::sweeps::run_fine_sweep))
        .route("/sweeps/reservations", post(api::sweeps::run_expiry_sweep))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
