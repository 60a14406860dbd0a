//! # pay-p24
//!
//! Przelewy24 payment processor for p24-gateway-rs.
//!
//! This crate provides:
//!
//! 1. **P24Options** - plugin option validation (JSON, TOML or environment)
//! 2. **P24Client** - REST client for registration, details, verification and refunds
//! 3. **P24PaymentProcessor** - the platform's payment lifecycle mapped onto the gateway
//! 4. **NotificationHandler** - signed notification intake and cart completion
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_p24::{P24Client, P24Options, P24PaymentProcessor};
//! use pay_core::PaymentProcessor;
//!
//! let client = Arc::new(P24Client::connect(P24Options::from_env()?).await?);
//! let processor = P24PaymentProcessor::new(client.clone());
//!
//! let session = processor.initiate_payment(&context).await?;
//! // redirect the customer to session.session_data["redirectUrl"]
//! ```
//!
//! ## Notification Handling
//!
//! ```rust,ignore
//! use pay_p24::NotificationHandler;
//!
//! let handler = NotificationHandler::new(client, carts, idempotency_keys)
//!     .with_completion_strategy(completion);
//!
//! // In your notification endpoint:
//! handler.handle(&notification, &request_context).await?;
//! ```

pub mod client;
pub mod config;
pub mod processor;
pub mod sign;
pub mod template;
pub mod types;
pub mod webhook;

// Re-exports
pub use client::P24Client;
pub use config::P24Options;
pub use processor::{generate_session_id, P24PaymentProcessor, P24SessionData, PROCESSOR_ID};
pub use types::{Currency, NotificationRequest, TransactionDetails, Verification};
pub use webhook::{parse_session_id, NotificationHandler, NotificationOutcome, NOTIFICATION_PATH};
