//! # Przelewy24 Payment Processor
//!
//! Maps the platform's payment lifecycle onto Przelewy24 calls:
//!
//! | lifecycle        | gateway                                   |
//! |------------------|-------------------------------------------|
//! | initiate/update  | register transaction                      |
//! | authorize/status | transaction details (status 1, 2 = paid)  |
//! | capture          | transaction details + verify              |
//! | refund           | transaction details + refund              |
//! | cancel/delete    | none                                      |

use crate::client::P24Client;
use crate::template::format_template;
use crate::types::{Currency, Language, NotificationRequest, Order, RefundItem, RefundRequest, Verification};
use async_trait::async_trait;
use pay_core::{
    AuthorizeResponse, PaymentError, PaymentProcessor, PaymentProcessorContext, PaymentResult,
    PaymentSessionStatus, SessionData, SessionResponse,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Identifier the processor is registered under
pub const PROCESSOR_ID: &str = "przelewy24";

const REFUND_DESCRIPTION: &str = "Zwrot";

/// Session data this processor stores on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct P24SessionData {
    /// Gateway session id, `<cartId>.<uuid>`
    pub id: String,

    #[serde(default)]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    #[serde(flatten)]
    pub extra: SessionData,
}

impl P24SessionData {
    pub fn from_session(data: &SessionData) -> PaymentResult<Self> {
        serde_json::from_value(serde_json::Value::Object(data.clone())).map_err(|e| {
            PaymentError::InvalidRequest(format!("malformed Przelewy24 session data: {}", e))
        })
    }

    pub fn into_session(self) -> PaymentResult<SessionData> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(PaymentError::Internal("session data is not an object".to_string())),
            Err(e) => Err(PaymentError::Serialization(e.to_string())),
        }
    }
}

/// `<cartId>.<random suffix>`
pub fn generate_session_id(cart_id: &str) -> String {
    format!("{}.{}", cart_id, Uuid::new_v4())
}

pub struct P24PaymentProcessor {
    client: Arc<P24Client>,
}

impl P24PaymentProcessor {
    pub fn new(client: Arc<P24Client>) -> Self {
        Self { client }
    }

    /// Check an inbound notification's signature
    pub fn verify_notification(&self, notification: &NotificationRequest) -> bool {
        self.client.verify_notification(notification)
    }

    fn describe(&self, session_id: &str, context: &PaymentProcessorContext) -> String {
        let replacements = HashMap::from([
            ("id", session_id),
            ("email", context.email.as_str()),
            ("currency", context.currency_code.as_str()),
            ("resourceId", context.resource_id.as_str()),
        ]);
        format_template(&self.client.options().description_template, &replacements)
    }

    fn build_order(&self, session_id: String, context: &PaymentProcessorContext) -> PaymentResult<Order> {
        let address = context.billing_address.as_ref().ok_or_else(|| {
            PaymentError::InvalidRequest("billing address is required".to_string())
        })?;
        let currency: Currency = context.currency_code.parse()?;
        let options = self.client.options();

        Ok(Order {
            description: self.describe(&session_id, context),
            session_id,
            amount: context.amount,
            currency,
            email: context.email.clone(),
            country: address.country_code.to_uppercase(),
            language: Language::Pl,
            url_return: options.callback_url.clone(),
            url_status: options.notification_url.clone(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for P24PaymentProcessor {
    fn identifier(&self) -> &'static str {
        PROCESSOR_ID
    }

    #[instrument(skip(self, context), fields(cart_id = %context.resource_id))]
    async fn initiate_payment(
        &self,
        context: &PaymentProcessorContext,
    ) -> PaymentResult<SessionResponse> {
        let session_id = generate_session_id(&context.resource_id);
        let order = self.build_order(session_id, context)?;

        let registration = self
            .client
            .create_transaction(&order)
            .await
            .map_err(|e| PaymentError::processor("initiatePayment", e))?;

        let session = P24SessionData {
            redirect_url: Some(self.client.transaction_url(&registration.token)),
            id: order.session_id,
            token: registration.token,
            extra: SessionData::new(),
        };

        Ok(SessionResponse {
            session_data: session.into_session()?,
        })
    }

    async fn update_payment(
        &self,
        context: &PaymentProcessorContext,
    ) -> PaymentResult<SessionResponse> {
        debug!("Re-initiating Przelewy24 session for cart {}", context.resource_id);
        self.initiate_payment(context).await
    }

    async fn authorize_payment(
        &self,
        data: &SessionData,
        _context: &serde_json::Map<String, serde_json::Value>,
    ) -> PaymentResult<AuthorizeResponse> {
        P24SessionData::from_session(data)
            .map_err(|e| PaymentError::processor("authorizePayment", e))?;

        let status = self.get_payment_status(data).await;

        Ok(AuthorizeResponse {
            status,
            data: data.clone(),
        })
    }

    #[instrument(skip(self, data))]
    async fn capture_payment(&self, data: &SessionData) -> PaymentResult<SessionData> {
        let session = P24SessionData::from_session(data)
            .map_err(|e| PaymentError::processor("capturePayment", e))?;

        let tx = self
            .client
            .get_transaction_details(&session.id)
            .await
            .map_err(|e| PaymentError::processor("capturePayment", e))?;

        let verified = self
            .client
            .verify_transaction(&Verification {
                session_id: session.id.clone(),
                amount: tx.amount,
                currency: tx.currency,
                order_id: tx.order_id,
            })
            .await
            .map_err(|e| PaymentError::processor("capturePayment", e))?;

        if !verified {
            return Err(PaymentError::processor(
                "capturePayment",
                "failed to verify transaction",
            ));
        }

        info!("Captured Przelewy24 payment {}", session.id);
        Ok(data.clone())
    }

    #[instrument(skip(self, data))]
    async fn refund_payment(&self, data: &SessionData, amount: i64) -> PaymentResult<SessionData> {
        let session = P24SessionData::from_session(data)
            .map_err(|e| PaymentError::processor("refundPayment", e))?;

        let tx = self
            .client
            .get_transaction_details(&session.id)
            .await
            .map_err(|e| PaymentError::processor("refundPayment", e))?;

        let results = self
            .client
            .refund(&RefundRequest {
                request_id: Uuid::new_v4().to_string(),
                refunds_uuid: session.id.clone(),
                refunds: vec![RefundItem {
                    amount,
                    description: REFUND_DESCRIPTION.to_string(),
                    order_id: tx.order_id,
                    session_id: session.id.clone(),
                }],
            })
            .await
            .map_err(|e| PaymentError::processor("refundPayment", e))?;

        let first = results.first().ok_or_else(|| {
            PaymentError::processor("refundPayment", "gateway returned no refund result")
        })?;

        if !first.status {
            warn!("Przelewy24 refund rejected for {}: {}", session.id, first.reason());
            return Err(PaymentError::processor(
                "refundPayment",
                format!("refund was unsuccessful: {}", first.reason()),
            ));
        }

        info!("Refunded {} on Przelewy24 payment {}", amount, session.id);
        Ok(data.clone())
    }

    async fn cancel_payment(&self, data: &SessionData) -> PaymentResult<SessionData> {
        Ok(data.clone())
    }

    async fn delete_payment(&self, _data: &SessionData) -> PaymentResult<SessionData> {
        Ok(SessionData::new())
    }

    #[instrument(skip(self, data))]
    async fn get_payment_status(&self, data: &SessionData) -> PaymentSessionStatus {
        let session = match P24SessionData::from_session(data) {
            Ok(session) => session,
            Err(e) => {
                error!("Cannot read Przelewy24 session: {}", e);
                return PaymentSessionStatus::Error;
            }
        };

        match self.client.get_transaction_details(&session.id).await {
            Ok(tx) if tx.is_paid() => PaymentSessionStatus::Authorized,
            Ok(tx) => {
                debug!("Przelewy24 transaction {} status={}", session.id, tx.status);
                PaymentSessionStatus::Pending
            }
            Err(PaymentError::TransactionNotFound { .. }) => PaymentSessionStatus::Pending,
            Err(e) => {
                error!("Przelewy24 status lookup failed for {}: {}", session.id, e);
                PaymentSessionStatus::Error
            }
        }
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
