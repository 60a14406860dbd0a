//! # P24 Gateway
//!
//! Przelewy24 payment processor and notification service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables (or point P24_CONFIG at a TOML file)
//! export P24_MERCHANT_ID=123456
//! export P24_POS_ID=123456
//! export P24_API_KEY=...
//! export P24_CRC_KEY=...
//! export P24_CALLBACK_URL=https://shop.example.pl/checkout/return
//! export P24_NOTIFICATION_URL=https://api.example.pl/store/przelewy24/notify
//! export PLATFORM_URL=https://shop-backend.example.pl
//!
//! # Run the server
//! p24-gateway
//! ```

use pay_api::{routes, state::AppState};
use pay_p24::NOTIFICATION_PATH;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");

    tracing_subscriber::registry()
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Payment processors: {:?}",
        state.processors.identifiers()
    );

    // Create router
    let app = routes::create_router(state);

    info!("P24 gateway starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Notifications: POST http://{}{}", addr, NOTIFICATION_PATH);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
