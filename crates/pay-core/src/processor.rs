//! # Payment Processor Trait
//!
//! The contract the host platform drives for every payment session.
//! One implementation exists today (Przelewy24), registered under its identifier.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  PaymentProcessor (trait)                   │
//! │  ├── initiate_payment() / update_payment()                  │
//! │  ├── authorize_payment() / capture_payment()                │
//! │  ├── refund_payment() / cancel_payment() / delete_payment() │
//! │  ├── get_payment_status() / retrieve_payment()              │
//! │  └── update_payment_data()                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │ P24PaymentProcessor│
//!                  └───────────────────┘
//! ```

use crate::error::PaymentResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque per-session data the platform stores and hands back on every call.
pub type SessionData = serde_json::Map<String, serde_json::Value>;

/// Status of a payment session as seen by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSessionStatus {
    /// Registered, not yet paid
    Pending,
    /// Paid; ready to capture
    Authorized,
    /// Customer action needed
    RequiresMore,
    /// Gateway could not tell us anything useful
    Error,
    /// Session cancelled
    Canceled,
}

impl Default for PaymentSessionStatus {
    fn default() -> Self {
        PaymentSessionStatus::Pending
    }
}

/// Billing address; the gateway only takes the country
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub country_code: String,
}

/// Everything the platform knows when it opens or updates a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessorContext {
    /// Customer email
    pub email: String,

    /// ISO 4217 code, any case
    pub currency_code: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Id of the resource being paid for (the cart)
    pub resource_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<serde_json::Value>,

    /// Free-form platform context
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,

    /// Data of the session being updated, empty on initiate
    #[serde(default)]
    pub payment_session_data: SessionData,
}

/// Result of initiate/update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_data: SessionData,
}

/// Result of authorize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub status: PaymentSessionStatus,
    pub data: SessionData,
}

/// Core trait for payment processor implementations.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Name the platform registers this processor under.
    fn identifier(&self) -> &'static str;

    /// Open a payment session with the gateway.
    async fn initiate_payment(
        &self,
        context: &PaymentProcessorContext,
    ) -> PaymentResult<SessionResponse>;

    /// Cart changed after initiation.
    async fn update_payment(
        &self,
        context: &PaymentProcessorContext,
    ) -> PaymentResult<SessionResponse>;

    /// Report whether the customer has paid.
    async fn authorize_payment(
        &self,
        data: &SessionData,
        context: &serde_json::Map<String, serde_json::Value>,
    ) -> PaymentResult<AuthorizeResponse>;

    /// Settle an authorized payment.
    async fn capture_payment(&self, data: &SessionData) -> PaymentResult<SessionData>;

    /// Return `amount` (smallest unit) to the customer.
    async fn refund_payment(&self, data: &SessionData, amount: i64) -> PaymentResult<SessionData>;

    async fn cancel_payment(&self, data: &SessionData) -> PaymentResult<SessionData>;

    async fn delete_payment(&self, data: &SessionData) -> PaymentResult<SessionData>;

    /// Current status. Never fails; gateway errors become `Error`.
    async fn get_payment_status(&self, data: &SessionData) -> PaymentSessionStatus;

    async fn retrieve_payment(&self, data: &SessionData) -> PaymentResult<serde_json::Value>;

    /// Platform-side data update, no gateway call.
    async fn update_payment_data(
        &self,
        session_id: &str,
        data: SessionData,
    ) -> PaymentResult<SessionData>;
}

/// Type alias for a boxed payment processor (dynamic dispatch)
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;

/// Processors keyed by identifier
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, BoxedPaymentProcessor>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor under its identifier
    pub fn register(&mut self, processor: BoxedPaymentProcessor) {
        let name = processor.identifier().to_string();
        self.processors.insert(name, processor);
    }

    /// Register with builder pattern
    pub fn with_processor(mut self, processor: BoxedPaymentProcessor) -> Self {
        self.register(processor);
        self
    }

    pub fn get(&self, identifier: &str) -> Option<&BoxedPaymentProcessor> {
        self.processors.get(identifier)
    }

    /// List all registered identifiers
    pub fn identifiers(&self) -> Vec<&str> {
        self.processors.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopProcessor;

    #[async_trait]
    impl PaymentProcessor for NoopProcessor {
        fn identifier(&self) -> &'static str {
            "noop"
        }

        async fn initiate_payment(
            &self,
            _context: &PaymentProcessorContext,
        ) -> PaymentResult<SessionResponse> {
            Ok(SessionResponse {
                session_data: SessionData::new(),
            })
        }

        async fn update_payment(
            &self,
            context: &PaymentProcessorContext,
        ) -> PaymentResult<SessionResponse> {
            self.initiate_payment(context).await
        }

        async fn authorize_payment(
            &self,
            data: &SessionData,
            _context: &serde_json::Map<String, serde_json::Value>,
        ) -> PaymentResult<AuthorizeResponse> {
            Ok(AuthorizeResponse {
                status: PaymentSessionStatus::Authorized,
                data: data.clone(),
            })
        }

        async fn capture_payment(&self, data: &SessionData) -> PaymentResult<SessionData> {
            Ok(data.clone())
        }

        async fn refund_payment(&self, data: &SessionData, _amount: i64) -> PaymentResult<SessionData> {
            Ok(data.clone())
        }

        async fn cancel_payment(&self, data: &SessionData) -> PaymentResult<SessionData> {
            Ok(data.clone())
        }

        async fn delete_payment(&self, _data: &SessionData) -> PaymentResult<SessionData> {
            Ok(SessionData::new())
        }

        async fn get_payment_status(&self, _data: &SessionData) -> PaymentSessionStatus {
            PaymentSessionStatus::Pending
        }

        async fn retrieve_payment(&self, data: &SessionData) -> PaymentResult<serde_json::Value> {
            Ok(serde_json::Value::Object(data.clone()))
        }

        async fn update_payment_data(
            &self,
            _session_id: &str,
            data: SessionData,
        ) -> PaymentResult<SessionData> {
            Ok(data)
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ProcessorRegistry::new().with_processor(Arc::new(NoopProcessor));

        assert_eq!(registry.get("noop").map(|p| p.identifier()), Some("noop"));
        assert!(registry.get("paypal").is_none());
        assert_eq!(registry.identifiers(), vec!["noop"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProcessorRegistry::default();
        assert!(registry.get("przelewy24").is_none());
        assert!(registry.identifiers().is_empty());
    }

    #[test]
    fn test_context_deserializes_without_optional_fields() {
        let context: PaymentProcessorContext = serde_json::from_value(serde_json::json!({
            "email": "jan@example.pl",
            "currency_code": "pln",
            "amount": 1299,
            "resource_id": "cart_01"
        }))
        .unwrap();

        assert!(context.billing_address.is_none());
        assert!(context.payment_session_data.is_empty());
    }
}
