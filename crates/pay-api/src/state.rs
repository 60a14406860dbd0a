//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the registered payment processors and the notification workflow.

use crate::platform::HttpPlatform;
use anyhow::Context;
use pay_core::{
    CartCompletionStrategy, CartService, IdempotencyKeyService, InMemoryPlatform,
    ProcessorRegistry,
};
use pay_p24::{NotificationHandler, P24Client, P24Options, P24PaymentProcessor};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Store API of the host platform; in-memory carts when unset
    pub platform_url: Option<String>,
    /// Bearer token for the host platform
    pub platform_token: Option<String>,
    /// TOML file with Przelewy24 plugin options; `P24_*` env vars when unset
    pub p24_config_path: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            platform_url: std::env::var("PLATFORM_URL").ok(),
            platform_token: std::env::var("PLATFORM_TOKEN").ok(),
            p24_config_path: std::env::var("P24_CONFIG").ok(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    fn load_p24_options(&self) -> anyhow::Result<P24Options> {
        let options = match &self.p24_config_path {
            Some(path) => P24Options::from_toml_file(path),
            None => P24Options::from_env(),
        };
        options.map_err(|e| anyhow::anyhow!("Invalid Przelewy24 options: {}", e))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment processors by identifier
    pub processors: ProcessorRegistry,
    /// Notification workflow
    pub notifications: NotificationHandler,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state from the environment; fails if the gateway rejects our credentials.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let options = config.load_p24_options()?;

        let client = P24Client::connect(options)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize Przelewy24: {}", e))?;

        let (carts, keys, completion) = match &config.platform_url {
            Some(url) => {
                let platform = Arc::new(
                    HttpPlatform::new(url.clone(), config.platform_token.clone())
                        .map_err(|e| anyhow::anyhow!("Failed to initialize platform client: {}", e))?,
                );
                tracing::info!("Using host platform at {}", url);
                platform_services(platform)
            }
            None => {
                tracing::warn!("PLATFORM_URL not set, using in-memory carts");
                platform_services(Arc::new(InMemoryPlatform::new()))
            }
        };

        Ok(Self::from_parts(
            config,
            Arc::new(client),
            carts,
            keys,
            Some(completion),
        ))
    }

    /// Assemble state from already-built services
    pub fn from_parts(
        config: AppConfig,
        client: Arc<P24Client>,
        carts: Arc<dyn CartService>,
        idempotency_keys: Arc<dyn IdempotencyKeyService>,
        completion: Option<Arc<dyn CartCompletionStrategy>>,
    ) -> Self {
        let mut notifications = NotificationHandler::new(client.clone(), carts, idempotency_keys);
        if let Some(strategy) = completion {
            notifications = notifications.with_completion_strategy(strategy);
        }

        let processors = ProcessorRegistry::new()
            .with_processor(Arc::new(P24PaymentProcessor::new(client)));

        Self {
            processors,
            notifications,
            config,
        }
    }
}

type PlatformServices = (
    Arc<dyn CartService>,
    Arc<dyn IdempotencyKeyService>,
    Arc<dyn CartCompletionStrategy>,
);

fn platform_services<P>(platform: Arc<P>) -> PlatformServices
where
    P: CartService + IdempotencyKeyService + CartCompletionStrategy + 'static,
{
    (platform.clone(), platform.clone(), platform)
}
