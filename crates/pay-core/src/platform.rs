//! # Host Platform Services
//!
//! The services the notification workflow borrows from the e-commerce platform.
//! Carts and orders live on the platform; this crate only reads and completes them.

use crate::error::PaymentResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The platform's view of a cart, reduced to what payment handling reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    /// Total in the smallest currency unit
    #[serde(default)]
    pub total: i64,

    /// Set once an order has been placed from this cart
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            currency_code: None,
            total: 0,
            completed_at: None,
        }
    }

    pub fn with_total(mut self, total: i64, currency_code: impl Into<String>) -> Self {
        self.total = total;
        self.currency_code = Some(currency_code.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Idempotency key issued by the platform for one completion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyKey {
    pub idempotency_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Parameters for creating an idempotency key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdempotencyKeyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
}

/// Request metadata passed through to the completion strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// What the completion strategy answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub response_code: u16,

    #[serde(default)]
    pub response_body: serde_json::Value,
}

impl CompletionResponse {
    pub fn is_success(&self) -> bool {
        self.response_code == 200
    }
}

#[async_trait]
pub trait CartService: Send + Sync {
    /// `Ok(None)` when the platform has no such cart.
    async fn retrieve(&self, cart_id: &str) -> PaymentResult<Option<Cart>>;
}

#[async_trait]
pub trait IdempotencyKeyService: Send + Sync {
    async fn create(&self, request: IdempotencyKeyRequest) -> PaymentResult<IdempotencyKey>;
}

/// Finalizes an order from a paid cart.
#[async_trait]
pub trait CartCompletionStrategy: Send + Sync {
    async fn complete(
        &self,
        cart_id: &str,
        idempotency_key: &IdempotencyKey,
        context: &RequestContext,
    ) -> PaymentResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_completion_flag() {
        let mut cart = Cart::new("cart_01").with_total(4999, "pln");
        assert!(!cart.is_completed());

        cart.completed_at = Some(Utc::now());
        assert!(cart.is_completed());
    }

    #[test]
    fn test_cart_parses_platform_null_completed_at() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "id": "cart_01",
            "total": 100,
            "completed_at": null
        }))
        .unwrap();

        assert!(!cart.is_completed());
    }

    #[test]
    fn test_completion_response_success() {
        let ok = CompletionResponse {
            response_code: 200,
            response_body: serde_json::Value::Null,
        };
        let conflict = CompletionResponse {
            response_code: 409,
            response_body: serde_json::Value::Null,
        };

        assert!(ok.is_success());
        assert!(!conflict.is_success());
    }
}
