//! # pay-core
//!
//! Payment processor contract for the p24 gateway.
//!
//! This crate provides:
//! - `PaymentProcessor` trait the host platform drives per payment session
//! - `ProcessorRegistry` for looking processors up by identifier
//! - `CartService`, `IdempotencyKeyService` and `CartCompletionStrategy`,
//!   the platform services used to finalize a paid cart
//! - `InMemoryPlatform`, a local implementation of those services
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{PaymentProcessor, PaymentProcessorContext};
//!
//! let session = processor.initiate_payment(&context).await?;
//! // persist session.session_data on the payment session
//!
//! let status = processor.get_payment_status(&session.session_data).await;
//! ```

pub mod error;
pub mod memory;
pub mod platform;
pub mod processor;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use memory::InMemoryPlatform;
pub use platform::{
    Cart, CartCompletionStrategy, CartService, CompletionResponse, IdempotencyKey,
    IdempotencyKeyRequest, IdempotencyKeyService, RequestContext,
};
pub use processor::{
    Address, AuthorizeResponse, BoxedPaymentProcessor, PaymentProcessor,
    PaymentProcessorContext, PaymentSessionStatus, ProcessorRegistry, SessionData,
    SessionResponse,
};
