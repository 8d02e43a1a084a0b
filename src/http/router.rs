//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Registration lifecycle
        .route("/registrations", post(handlers::create_registration))
        .route("/registrations/{code}", get(handlers::get_receipt))
        .route(
            "/registrations/{code}",
            delete(handlers::cancel_registration),
        )
        // Entities and their registration windows
        .route("/entities", post(handlers::create_entity))
        .route("/entities/{kind}", get(handlers::list_entities))
        .route("/entities/{kind}/{id}", get(handlers::get_entity))
        .route("/entities/{kind}/{id}", delete(handlers::deactivate_entity))
        .route("/entities/{kind}/{id}/window", get(handlers::get_window))
        // Exam results
        .route("/results", post(handlers::record_result));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
