//! # Przelewy24 Notification Handling
//!
//! The gateway posts a signed notification to `urlStatus` once the customer pays.
//! A notification is accepted only when its signature and amounts check out and
//! the cart it names is still open; the cart is then completed and the
//! transaction verified with the gateway.

use crate::client::P24Client;
use crate::types::NotificationRequest;
use pay_core::{
    CartCompletionStrategy, CartService, IdempotencyKeyRequest, IdempotencyKeyService,
    PaymentError, PaymentResult, RequestContext,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Path the gateway is told to post notifications to
pub const NOTIFICATION_PATH: &str = "/store/przelewy24/notify";

/// A notification that completed its cart
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub cart_id: String,
    pub session_id: String,
    pub order_id: i64,
}

/// Split `<cartId>.<suffix>[...]` into cart id and suffix.
pub fn parse_session_id(session_id: &str) -> PaymentResult<(&str, &str)> {
    let mut parts = session_id.split('.');

    match (parts.next(), parts.next()) {
        (Some(cart_id), Some(suffix)) if !cart_id.is_empty() && !suffix.is_empty() => {
            Ok((cart_id, suffix))
        }
        _ => Err(PaymentError::InvalidSessionId {
            session_id: session_id.to_string(),
        }),
    }
}

/// Runs the notification workflow against the platform services.
#[derive(Clone)]
pub struct NotificationHandler {
    client: Arc<P24Client>,
    carts: Arc<dyn CartService>,
    idempotency_keys: Arc<dyn IdempotencyKeyService>,
    completion: Option<Arc<dyn CartCompletionStrategy>>,
}

impl NotificationHandler {
    pub fn new(
        client: Arc<P24Client>,
        carts: Arc<dyn CartService>,
        idempotency_keys: Arc<dyn IdempotencyKeyService>,
    ) -> Self {
        Self {
            client,
            carts,
            idempotency_keys,
            completion: None,
        }
    }

    pub fn with_completion_strategy(mut self, strategy: Arc<dyn CartCompletionStrategy>) -> Self {
        self.completion = Some(strategy);
        self
    }

    /// Handle one notification; every rejection is logged against its session id.
    #[instrument(skip(self, notification, context), fields(session_id = %notification.session_id))]
    pub async fn handle(
        &self,
        notification: &NotificationRequest,
        context: &RequestContext,
    ) -> PaymentResult<NotificationOutcome> {
        match self.process(notification, context).await {
            Ok(outcome) => {
                info!(
                    "P24({}): cart {} completed, order {} verified",
                    notification.session_id, outcome.cart_id, outcome.order_id
                );
                Ok(outcome)
            }
            Err(e) => {
                error!("P24({}): {}", notification.session_id, rejection_reason(&e));
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        notification: &NotificationRequest,
        context: &RequestContext,
    ) -> PaymentResult<NotificationOutcome> {
        if !self.client.verify_notification(notification) {
            return Err(PaymentError::NotificationUnauthorized {
                session_id: notification.session_id.clone(),
            });
        }

        if notification.amount != notification.origin_amount {
            return Err(PaymentError::AmountMismatch {
                amount: notification.amount,
                origin_amount: notification.origin_amount,
            });
        }

        let (cart_id, _) = parse_session_id(&notification.session_id)?;

        let cart = self
            .carts
            .retrieve(cart_id)
            .await?
            .ok_or_else(|| PaymentError::CartNotFound {
                cart_id: cart_id.to_string(),
            })?;

        if cart.is_completed() {
            return Err(PaymentError::CartAlreadyCompleted { cart_id: cart.id });
        }

        let strategy = self
            .completion
            .as_ref()
            .ok_or(PaymentError::CompletionStrategyMissing)?;

        let idempotency_key = self
            .idempotency_keys
            .create(IdempotencyKeyRequest {
                request_method: Some("POST".to_string()),
                request_path: Some(format!("/store/carts/{}/complete", cart.id)),
            })
            .await?;

        let completion = strategy.complete(&cart.id, &idempotency_key, context).await?;
        if !completion.is_success() {
            return Err(PaymentError::CartCompletionFailed {
                cart_id: cart.id,
                response_code: completion.response_code,
            });
        }

        let verified = self
            .client
            .verify_transaction(&notification.verification())
            .await
            .unwrap_or_else(|e| {
                error!("P24({}): verify call failed: {}", notification.session_id, e);
                false
            });

        if !verified {
            return Err(PaymentError::VerificationFailed {
                session_id: notification.session_id.clone(),
            });
        }

        Ok(NotificationOutcome {
            cart_id: cart.id,
            session_id: notification.session_id.clone(),
            order_id: notification.order_id,
        })
    }
}

fn rejection_reason(err: &PaymentError) -> String {
    match err {
        PaymentError::NotificationUnauthorized { .. } => "Unauthorized notification".to_string(),
        PaymentError::CartCompletionFailed { response_code, .. } => {
            format!("Cart completion failed (response code {})", response_code)
        }
        other => other.to_string(),
    }
}
