//! # pay-api
//!
//! HTTP API layer for p24-gateway-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The Przelewy24 notification endpoint
//! - Payment-processor lifecycle endpoints for the host platform
//! - An HTTP client for the host platform's cart API
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/store/przelewy24/notify` | Przelewy24 notification |
//! | POST | `/api/v1/processors/{id}/{operation}` | Processor lifecycle call |

pub mod handlers;
pub mod platform;
pub mod routes;
pub mod state;

pub use platform::HttpPlatform;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
