//! # Payment Error Types
//!
//! Typed error handling for the p24 gateway.
//! Every processor call and every notification outcome is a `Result<T, PaymentError>`,
//! and each variant maps to exactly one HTTP status.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, unreachable gateway at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A plugin option has the wrong type
    #[error("{option} {problem}")]
    InvalidOption {
        option: &'static str,
        problem: &'static str,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Currency not supported by the gateway
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The gateway has no transaction registered under this session
    #[error("Transaction not found: {session_id}")]
    TransactionNotFound { session_id: String },

    /// A processor lifecycle call failed
    #[error("P24: {operation} failed: {message}")]
    Processor {
        operation: &'static str,
        message: String,
    },

    /// Notification signature did not match
    #[error("Unauthorized")]
    NotificationUnauthorized { session_id: String },

    /// Paid amount differs from the registered amount
    #[error("Amount mismatch: {amount} !== {origin_amount}")]
    AmountMismatch { amount: i64, origin_amount: i64 },

    /// Session id does not have the `<cartId>.<suffix>` shape
    #[error("Invalid session id: {session_id}")]
    InvalidSessionId { session_id: String },

    /// Cart referenced by the session id does not exist
    #[error("Cart not found: {cart_id}")]
    CartNotFound { cart_id: String },

    /// Cart was completed before this notification arrived
    #[error("Cart already completed")]
    CartAlreadyCompleted { cart_id: String },

    /// No cart completion strategy is wired into the service
    #[error("Cart completion strategy not found")]
    CompletionStrategyMissing,

    /// The completion strategy answered with a non-200 code
    #[error("Cart completion failed")]
    CartCompletionFailed { cart_id: String, response_code: u16 },

    /// Gateway refused to verify the transaction
    #[error("Verification failed")]
    VerificationFailed { session_id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::NetworkError(_) | PaymentError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidOption { .. } => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::UnsupportedCurrency { .. } => 400,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::TransactionNotFound { .. } => 404,
            PaymentError::Processor { .. } => 502,
            PaymentError::NotificationUnauthorized { .. } => 400,
            PaymentError::AmountMismatch { .. } => 400,
            PaymentError::InvalidSessionId { .. } => 400,
            PaymentError::CartNotFound { .. } => 404,
            PaymentError::CartAlreadyCompleted { .. } => 400,
            PaymentError::CompletionStrategyMissing => 500,
            PaymentError::CartCompletionFailed { .. } => 500,
            PaymentError::VerificationFailed { .. } => 400,
            PaymentError::Serialization(_) => 500,
            PaymentError::Internal(_) => 500,
        }
    }

    /// Wrap any failure as a failed processor operation
    pub fn processor(operation: &'static str, message: impl std::fmt::Display) -> Self {
        PaymentError::Processor {
            operation,
            message: message.to_string(),
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::NetworkError("timeout".into()).is_retryable());
        assert!(!PaymentError::InvalidRequest("bad data".into()).is_retryable());
        assert!(!PaymentError::CompletionStrategyMissing.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PaymentError::NotificationUnauthorized {
                session_id: "c.1".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            PaymentError::CartCompletionFailed {
                cart_id: "c".into(),
                response_code: 409
            }
            .status_code(),
            500
        );
        assert_eq!(
            PaymentError::CartNotFound {
                cart_id: "c".into()
            }
            .status_code(),
            404
        );
    }

    #[test]
    fn test_messages() {
        let err = PaymentError::InvalidOption {
            option: "merchantId",
            problem: "is not a number",
        };
        assert_eq!(err.to_string(), "merchantId is not a number");

        let err = PaymentError::InvalidOption {
            option: "useSandbox",
            problem: "should be either a boolean or undefined",
        };
        assert_eq!(
            err.to_string(),
            "useSandbox should be either a boolean or undefined"
        );

        let err = PaymentError::processor("capturePayment", "failed to verify transaction");
        assert_eq!(
            err.to_string(),
            "P24: capturePayment failed: failed to verify transaction"
        );

        let err = PaymentError::AmountMismatch {
            amount: 100,
            origin_amount: 200,
        };
        assert_eq!(err.to_string(), "Amount mismatch: 100 !== 200");
    }
}
