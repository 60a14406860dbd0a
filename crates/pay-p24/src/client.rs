//! # Przelewy24 REST Client
//!
//! Thin client over the gateway's v1 REST API. Requests authenticate with
//! HTTP basic auth (`posId:apiKey`) and carry SHA-384 signatures where the
//! gateway requires them.

use crate::config::P24Options;
use crate::sign;
use crate::types::{
    NotificationRequest, Order, RefundRequest, RefundResult, TransactionDetails,
    TransactionRegistration, Verification,
};
use pay_core::{PaymentError, PaymentResult};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const PROVIDER: &str = "przelewy24";
const TRANSACTION_NOT_FOUND: &str = "Transaction not found";

pub struct P24Client {
    options: P24Options,
    client: Client,
}

impl P24Client {
    pub fn new(options: P24Options) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { options, client })
    }

    /// Build a client and make sure the gateway accepts our credentials.
    pub async fn connect(options: P24Options) -> PaymentResult<Self> {
        let client = Self::new(options)?;

        match client.test_access().await {
            Ok(true) => Ok(client),
            Ok(false) => Err(PaymentError::Configuration(
                "test request to Przelewy24 has failed: access denied".to_string(),
            )),
            Err(e) => Err(PaymentError::Configuration(format!(
                "test request to Przelewy24 has failed: {}",
                e
            ))),
        }
    }

    pub fn options(&self) -> &P24Options {
        &self.options
    }

    /// Hosted payment page for a registered transaction
    pub fn transaction_url(&self, token: &str) -> String {
        format!("{}/trnRequest/{}", self.options.api_base_url(), token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.options.api_base_url(), path)
    }

    /// `url(path)` with `segment` appended as one percent-encoded path segment
    fn url_with_segment(&self, path: &str, segment: &str) -> PaymentResult<Url> {
        let base = self.url(path);
        let mut url = Url::parse(&base)
            .map_err(|e| PaymentError::Configuration(format!("invalid gateway URL {}: {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| PaymentError::Configuration(format!("gateway URL {} cannot be a base", base)))?
            .push(segment);

        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(self.options.pos_id, Some(&self.options.api_key))
    }

    /// `GET /testAccess`
    #[instrument(skip(self))]
    pub async fn test_access(&self) -> PaymentResult<bool> {
        let request = self.authorized(self.client.get(self.url("/testAccess")));
        let granted: bool = self.send(request).await?;
        debug!("Przelewy24 access test: {}", granted);
        Ok(granted)
    }

    /// `POST /transaction/register`, returns the payment token
    #[instrument(skip(self, order), fields(session_id = %order.session_id))]
    pub async fn create_transaction(&self, order: &Order) -> PaymentResult<TransactionRegistration> {
        let sign = sign::register_signature(order, self.options.merchant_id, &self.options.crc_key)?;

        let body = RegisterBody {
            merchant_id: self.options.merchant_id,
            pos_id: self.options.pos_id,
            order,
            sign,
        };

        let request = self.authorized(self.client.post(self.url("/transaction/register")).json(&body));
        let registration: TransactionRegistration = self.send(request).await?;

        info!(
            "Registered Przelewy24 transaction: session={}, amount={} {}",
            order.session_id, order.amount, order.currency
        );

        Ok(registration)
    }

    /// `GET /transaction/by/sessionId/{sessionId}`
    #[instrument(skip(self))]
    pub async fn get_transaction_details(&self, session_id: &str) -> PaymentResult<TransactionDetails> {
        let url = self.url_with_segment("/transaction/by/sessionId", session_id)?;
        let request = self.authorized(self.client.get(url));

        match self.send(request).await {
            Err(PaymentError::ProviderError { message, .. }) if message == TRANSACTION_NOT_FOUND => {
                Err(PaymentError::TransactionNotFound {
                    session_id: session_id.to_string(),
                })
            }
            other => other,
        }
    }

    /// `PUT /transaction/verify`. `Ok(false)` when the gateway answers but does not confirm.
    #[instrument(skip(self, verification), fields(session_id = %verification.session_id))]
    pub async fn verify_transaction(&self, verification: &Verification) -> PaymentResult<bool> {
        let sign = sign::verify_signature(verification, &self.options.crc_key)?;

        let body = VerifyBody {
            merchant_id: self.options.merchant_id,
            pos_id: self.options.pos_id,
            verification,
            sign,
        };

        let request = self.authorized(self.client.put(self.url("/transaction/verify")).json(&body));
        let result: VerifyData = self.send(request).await?;

        let verified = result.status == "success";
        if verified {
            info!("Verified Przelewy24 transaction {}", verification.order_id);
        } else {
            warn!("Przelewy24 verification answered status={}", result.status);
        }
        Ok(verified)
    }

    /// `POST /transaction/refund`
    #[instrument(skip(self, refund), fields(request_id = %refund.request_id))]
    pub async fn refund(&self, refund: &RefundRequest) -> PaymentResult<Vec<RefundResult>> {
        let request = self.authorized(self.client.post(self.url("/transaction/refund")).json(refund));
        self.send(request).await
    }

    /// Check an inbound notification's signature against our CRC key.
    pub fn verify_notification(&self, notification: &NotificationRequest) -> bool {
        if notification.merchant_id != self.options.merchant_id
            || notification.pos_id != self.options.pos_id
        {
            return false;
        }

        match sign::notification_signature(notification, &self.options.crc_key) {
            Ok(expected) => sign::constant_time_compare(&expected, &notification.sign),
            Err(e) => {
                error!("Failed to compute notification signature: {}", e);
                false
            }
        }
    }

    /// Send a request and unwrap the gateway's `{ "data": ... }` envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PaymentResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Przelewy24 API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<ErrorBody>(&body) {
                return Err(PaymentError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.message(),
                });
            }

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Przelewy24 response: {}", e))
        })?;

        Ok(envelope.data)
    }
}

// =============================================================================
// Wire envelopes
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    merchant_id: u64,
    pos_id: u64,
    #[serde(flatten)]
    order: &'a Order,
    sign: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody<'a> {
    merchant_id: u64,
    pos_id: u64,
    #[serde(flatten)]
    verification: &'a Verification,
    sign: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

impl ErrorBody {
    /// `error` is a string for most endpoints and a list for refunds
    fn message(&self) -> String {
        match &self.error {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
