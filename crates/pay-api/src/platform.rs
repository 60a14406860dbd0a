//! # Host Platform Client
//!
//! Cart lookup and completion against the e-commerce platform's store API.
//! Idempotency keys are minted locally and sent as the `Idempotency-Key` header.

use async_trait::async_trait;
use chrono::Utc;
use pay_core::{
    Cart, CartCompletionStrategy, CartService, CompletionResponse, IdempotencyKey,
    IdempotencyKeyRequest, IdempotencyKeyService, PaymentError, PaymentResult, RequestContext,
};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct HttpPlatform {
    base_url: String,
    client: Client,
    api_token: Option<String>,
}

impl HttpPlatform {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            api_token,
        })
    }

    /// `{base}/store/carts/{cart_id}[/{action}]`, with the cart id percent-encoded
    fn cart_url(&self, cart_id: &str, action: Option<&str>) -> PaymentResult<Url> {
        let mut url = Url::parse(&format!("{}/store/carts", self.base_url)).map_err(|e| {
            PaymentError::Configuration(format!("invalid platform URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Configuration(format!("platform URL {} cannot be a base", self.base_url))
            })?
            .push(cart_id)
            .extend(action);

        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Deserialize)]
struct CartEnvelope {
    cart: Cart,
}

#[async_trait]
impl CartService for HttpPlatform {
    #[instrument(skip(self))]
    async fn retrieve(&self, cart_id: &str) -> PaymentResult<Option<Cart>> {
        let response = self
            .authorized(self.client.get(self.cart_url(cart_id, None)?))
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Platform cart lookup failed: status={}, body={}", status, body);
            return Err(PaymentError::ProviderError {
                provider: "platform".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let envelope: CartEnvelope = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse cart response: {}", e))
        })?;

        Ok(Some(envelope.cart))
    }
}

#[async_trait]
impl IdempotencyKeyService for HttpPlatform {
    async fn create(&self, request: IdempotencyKeyRequest) -> PaymentResult<IdempotencyKey> {
        Ok(IdempotencyKey {
            idempotency_key: Uuid::new_v4().to_string(),
            request_path: request.request_path,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CartCompletionStrategy for HttpPlatform {
    #[instrument(skip(self, idempotency_key, context))]
    async fn complete(
        &self,
        cart_id: &str,
        idempotency_key: &IdempotencyKey,
        context: &RequestContext,
    ) -> PaymentResult<CompletionResponse> {
        let mut request = self
            .authorized(self.client.post(self.cart_url(cart_id, Some("complete"))?))
            .header("Idempotency-Key", &idempotency_key.idempotency_key);

        if let Some(request_id) = &context.request_id {
            request = request.header("X-Request-Id", request_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let response_code = response.status().as_u16();
        let response_body = match response.json::<serde_json::Value>().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Platform completion for {} returned no JSON body: {}", cart_id, e);
                serde_json::Value::Null
            }
        };

        debug!("Platform completion for {} answered {}", cart_id, response_code);

        Ok(CompletionResponse {
            response_code,
            response_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retrieve_cart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/carts/cart_01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cart": { "id": "cart_01", "total": 1299, "completed_at": null }
            })))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(format!("{}/", server.uri()), None).unwrap();
        let cart = platform.retrieve("cart_01").await.unwrap().unwrap();

        assert_eq!(cart.total, 1299);
        assert!(!cart.is_completed());
    }

    #[tokio::test]
    async fn test_retrieve_missing_cart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/carts/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(server.uri(), None).unwrap();
        assert!(platform.retrieve("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_sends_idempotency_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/store/carts/cart_01/complete"))
            .and(header_exists("Idempotency-Key"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "type": "order", "data": {} })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(server.uri(), Some("secret".to_string())).unwrap();
        let key = platform.create(IdempotencyKeyRequest::default()).await.unwrap();
        let response = platform
            .complete("cart_01", &key, &RequestContext::default())
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.response_body["type"], "order");
    }

    #[tokio::test]
    async fn test_cart_id_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/carts/cart%2F01%3Fx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cart": { "id": "cart/01?x", "total": 10, "completed_at": null }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(server.uri(), None).unwrap();
        let cart = platform.retrieve("cart/01?x").await.unwrap().unwrap();

        assert_eq!(cart.id, "cart/01?x");
    }

    #[tokio::test]
    async fn test_complete_without_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/store/carts/cart_01/complete"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(server.uri(), None).unwrap();
        let key = platform.create(IdempotencyKeyRequest::default()).await.unwrap();
        let response = platform
            .complete("cart_01", &key, &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(response.response_code, 409);
        assert!(response.response_body.is_null());
    }
}
