//! # In-Memory Platform
//!
//! A self-contained stand-in for the host platform's cart, idempotency-key and
//! completion services. Backs the tests and local runs without a platform.

use crate::error::{PaymentError, PaymentResult};
use crate::platform::{
    Cart, CartCompletionStrategy, CartService, CompletionResponse, IdempotencyKey,
    IdempotencyKeyRequest, IdempotencyKeyService, RequestContext,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryPlatform {
    carts: RwLock<HashMap<String, Cart>>,
    /// Keys used for each successful completion, in order
    completions: RwLock<Vec<(String, String)>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with carts
    pub fn with_carts(carts: impl IntoIterator<Item = Cart>) -> Self {
        let platform = Self::new();
        for cart in carts {
            platform.insert_cart(cart);
        }
        platform
    }

    /// Seeding recovers a poisoned store instead of dropping the cart
    pub fn insert_cart(&self, cart: Cart) {
        let mut carts = self.carts.write().unwrap_or_else(|e| {
            warn!("in-memory cart store lock poisoned, recovering");
            e.into_inner()
        });
        carts.insert(cart.id.clone(), cart);
    }

    /// `(cart_id, idempotency_key)` for every completed cart
    pub fn completions(&self) -> Vec<(String, String)> {
        self.completions
            .read()
            .unwrap_or_else(|e| {
                warn!("in-memory completion log lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }
}

fn poisoned() -> PaymentError {
    PaymentError::Internal("in-memory platform lock poisoned".to_string())
}

#[async_trait]
impl CartService for InMemoryPlatform {
    async fn retrieve(&self, cart_id: &str) -> PaymentResult<Option<Cart>> {
        let carts = self.carts.read().map_err(|_| poisoned())?;
        Ok(carts.get(cart_id).cloned())
    }
}

#[async_trait]
impl IdempotencyKeyService for InMemoryPlatform {
    async fn create(&self, request: IdempotencyKeyRequest) -> PaymentResult<IdempotencyKey> {
        Ok(IdempotencyKey {
            idempotency_key: Uuid::new_v4().to_string(),
            request_path: request.request_path,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CartCompletionStrategy for InMemoryPlatform {
    async fn complete(
        &self,
        cart_id: &str,
        idempotency_key: &IdempotencyKey,
        _context: &RequestContext,
    ) -> PaymentResult<CompletionResponse> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;

        let Some(cart) = carts.get_mut(cart_id) else {
            return Ok(CompletionResponse {
                response_code: 404,
                response_body: serde_json::json!({ "message": "cart not found" }),
            });
        };

        if cart.is_completed() {
            debug!("Cart {} already completed", cart_id);
            return Ok(CompletionResponse {
                response_code: 409,
                response_body: serde_json::json!({ "message": "cart already completed" }),
            });
        }

        cart.completed_at = Some(Utc::now());
        self.completions
            .write()
            .map_err(|_| poisoned())?
            .push((cart_id.to_string(), idempotency_key.idempotency_key.clone()));

        info!("Completed cart {}", cart_id);

        Ok(CompletionResponse {
            response_code: 200,
            response_body: serde_json::json!({
                "type": "order",
                "data": { "cart_id": cart_id }
            }),
        })
    }
}
