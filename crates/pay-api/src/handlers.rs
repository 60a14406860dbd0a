//! # Request Handlers
//!
//! Axum request handlers for the gateway notification endpoint and the
//! payment-processor lifecycle endpoints called by the host platform.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use pay_core::{
    AuthorizeResponse, BoxedPaymentProcessor, PaymentError, PaymentProcessorContext,
    PaymentSessionStatus, RequestContext, SessionData, SessionResponse,
};
use pay_p24::NotificationRequest;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of calls that act on an existing session
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_data: SessionData,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    #[serde(default)]
    pub session_data: SessionData,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub session_data: SessionData,
    /// Amount to refund, smallest currency unit
    pub refund_amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDataRequest {
    pub session_id: String,
    #[serde(default)]
    pub data: SessionData,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: PaymentSessionStatus,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    RequestContext {
        ip: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string())),
        user_agent: header("user-agent"),
        request_id: header("x-request-id").or_else(|| Some(uuid::Uuid::new_v4().to_string())),
    }
}

fn processor(state: &AppState, processor_id: &str) -> Result<BoxedPaymentProcessor, ApiError> {
    state.processors.get(processor_id).cloned().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Unknown payment processor: {}", processor_id),
                404,
            )),
        )
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "p24-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "processors": state.processors.identifiers(),
    }))
}

/// Handle a Przelewy24 payment notification
#[instrument(skip(state, headers, body))]
pub async fn p24_notify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let notification: NotificationRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected malformed Przelewy24 notification: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Invalid notification payload", 400).with_details(e.to_string()),
            ),
        )
    })?;

    info!(
        "Received Przelewy24 notification: session={}, order={}",
        notification.session_id, notification.order_id
    );

    state
        .notifications
        .handle(&notification, &request_context(&headers))
        .await
        .map_err(payment_error_to_response)?;

    Ok(StatusCode::OK)
}

#[instrument(skip(state, context), fields(cart_id = %context.resource_id))]
pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(context): Json<PaymentProcessorContext>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session = processor.initiate_payment(&context).await.map_err(|e| {
        error!("Failed to initiate payment: {}", e);
        payment_error_to_response(e)
    })?;
    Ok(Json(session))
}

#[instrument(skip(state, context), fields(cart_id = %context.resource_id))]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(context): Json<PaymentProcessorContext>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session = processor.update_payment(&context).await.map_err(|e| {
        error!("Failed to update payment: {}", e);
        payment_error_to_response(e)
    })?;
    Ok(Json(session))
}

pub async fn authorize_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let response = processor
        .authorize_payment(&request.session_data, &request.context)
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(response))
}

pub async fn capture_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session_data = processor
        .capture_payment(&request.session_data)
        .await
        .map_err(|e| {
            error!("Capture failed: {}", e);
            payment_error_to_response(e)
        })?;
    Ok(Json(SessionResponse { session_data }))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<RefundRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if request.refund_amount <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("refund_amount must be positive", 400)),
        ));
    }

    let processor = processor(&state, &processor_id)?;
    let session_data = processor
        .refund_payment(&request.session_data, request.refund_amount)
        .await
        .map_err(|e| {
            error!("Refund failed: {}", e);
            payment_error_to_response(e)
        })?;
    Ok(Json(SessionResponse { session_data }))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session_data = processor
        .cancel_payment(&request.session_data)
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(SessionResponse { session_data }))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session_data = processor
        .delete_payment(&request.session_data)
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(SessionResponse { session_data }))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let status = processor.get_payment_status(&request.session_data).await;
    Ok(Json(StatusResponse { status }))
}

pub async fn retrieve_payment(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let payment = processor
        .retrieve_payment(&request.session_data)
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(payment))
}

pub async fn update_payment_data(
    State(state): State<AppState>,
    Path(processor_id): Path<String>,
    Json(request): Json<UpdateDataRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let processor = processor(&state, &processor_id)?;
    let session_data = processor
        .update_payment_data(&request.session_id, request.data)
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(SessionResponse { session_data }))
}
