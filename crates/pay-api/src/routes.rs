//! # Routes
//!
//! Axum router configuration for the gateway service.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use pay_p24::NOTIFICATION_PATH;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Notifications:
///   - POST /store/przelewy24/notify - Przelewy24 payment notification
///
/// - Processor lifecycle (called by the host platform):
///   - POST /api/v1/processors/{processor_id}/initiate
///   - POST /api/v1/processors/{processor_id}/update
///   - POST /api/v1/processors/{processor_id}/authorize
///   - POST /api/v1/processors/{processor_id}/capture
///   - POST /api/v1/processors/{processor_id}/refund
///   - POST /api/v1/processors/{processor_id}/cancel
///   - POST /api/v1/processors/{processor_id}/delete
///   - POST /api/v1/processors/{processor_id}/status
///   - POST /api/v1/processors/{processor_id}/retrieve
///   - POST /api/v1/processors/{processor_id}/update-data
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let processor_routes = Router::new()
        .route("/{processor_id}/initiate", post(handlers::initiate_payment))
        .route("/{processor_id}/update", post(handlers::update_payment))
        .route("/{processor_id}/authorize", post(handlers::authorize_payment))
        .route("/{processor_id}/capture", post(handlers::capture_payment))
        .route("/{processor_id}/refund", post(handlers::refund_payment))
        .route("/{processor_id}/cancel", post(handlers::cancel_payment))
        .route("/{processor_id}/delete", post(handlers::delete_payment))
        .route("/{processor_id}/status", post(handlers::payment_status))
        .route("/{processor_id}/retrieve", post(handlers::retrieve_payment))
        .route("/{processor_id}/update-data", post(handlers::update_payment_data))
        .layer(cors);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Gateway notifications (raw body, no CORS)
        .route(NOTIFICATION_PATH, post(handlers::p24_notify))
        // Processor lifecycle
        .nest("/api/v1/processors", processor_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
