//! # Przelewy24 API Types
//!
//! Request and response bodies of the Przelewy24 REST API (v1).
//! Field names follow the gateway's camelCase wire format.

use pay_core::PaymentError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Currencies accepted by Przelewy24
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    PLN,
    EUR,
    GBP,
    CZK,
    USD,
    DKK,
    NOK,
    SEK,
    HUF,
    CHF,
    BGN,
    RON,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::PLN => "PLN",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CZK => "CZK",
            Currency::USD => "USD",
            Currency::DKK => "DKK",
            Currency::NOK => "NOK",
            Currency::SEK => "SEK",
            Currency::HUF => "HUF",
            Currency::CHF => "CHF",
            Currency::BGN => "BGN",
            Currency::RON => "RON",
        }
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    /// Case-insensitive, the platform stores codes in lower case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLN" => Ok(Currency::PLN),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "CZK" => Ok(Currency::CZK),
            "USD" => Ok(Currency::USD),
            "DKK" => Ok(Currency::DKK),
            "NOK" => Ok(Currency::NOK),
            "SEK" => Ok(Currency::SEK),
            "HUF" => Ok(Currency::HUF),
            "CHF" => Ok(Currency::CHF),
            "BGN" => Ok(Currency::BGN),
            "RON" => Ok(Currency::RON),
            _ => Err(PaymentError::UnsupportedCurrency {
                currency: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of the hosted payment page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bg,
    Cs,
    De,
    En,
    Es,
    Fr,
    Hr,
    Hu,
    It,
    Nl,
    Pl,
    Pt,
    Se,
    Sk,
    Ro,
}

impl Default for Language {
    fn default() -> Self {
        Language::Pl
    }
}

/// Transaction to register with the gateway.
///
/// Merchant and POS ids plus the signature are added by the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub session_id: String,

    /// Amount in grosz (smallest unit)
    pub amount: i64,

    pub currency: Currency,

    pub description: String,

    pub email: String,

    /// ISO 3166-1 alpha-2, upper case
    pub country: String,

    pub language: Language,

    pub url_return: String,

    pub url_status: String,
}

/// Token returned by transaction registration
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRegistration {
    pub token: String,
}

/// Gateway-side transaction status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    NoPayment,
    AdvancePayment,
    PaymentMade,
    PaymentReturned,
    Unknown(i32),
}

impl From<i32> for TransactionStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => TransactionStatus::NoPayment,
            1 => TransactionStatus::AdvancePayment,
            2 => TransactionStatus::PaymentMade,
            3 => TransactionStatus::PaymentReturned,
            other => TransactionStatus::Unknown(other),
        }
    }
}

/// `GET /transaction/by/sessionId/{sessionId}` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub order_id: i64,
    pub session_id: String,
    pub status: i32,
    pub amount: i64,
    pub currency: Currency,

    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_of_transaction: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub payment_method: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fee: Option<i64>,
}

impl TransactionDetails {
    pub fn transaction_status(&self) -> TransactionStatus {
        TransactionStatus::from(self.status)
    }

    /// Money reached the gateway (advance or full payment)
    pub fn is_paid(&self) -> bool {
        matches!(
            self.transaction_status(),
            TransactionStatus::AdvancePayment | TransactionStatus::PaymentMade
        )
    }
}

/// Fields the gateway needs to confirm a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub session_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub order_id: i64,
}

/// Body the gateway posts to `urlStatus` after a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub merchant_id: u64,
    pub pos_id: u64,
    pub session_id: String,
    pub amount: i64,
    pub origin_amount: i64,
    pub currency: Currency,
    pub order_id: i64,
    pub method_id: i64,
    pub statement: String,
    pub sign: String,
}

impl NotificationRequest {
    /// Verification request for the notified transaction
    pub fn verification(&self) -> Verification {
        Verification {
            session_id: self.session_id.clone(),
            amount: self.amount,
            currency: self.currency,
            order_id: self.order_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundItem {
    pub order_id: i64,
    pub session_id: String,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Unique per refund call
    pub request_id: String,
    pub refunds: Vec<RefundItem>,
    pub refunds_uuid: String,
}

/// Per-item outcome of a refund call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub order_id: i64,
    pub session_id: String,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl RefundResult {
    /// Why the gateway rejected the refund
    pub fn reason(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("pln".parse::<Currency>().unwrap(), Currency::PLN);
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::EUR);
        assert!(matches!(
            "jpy".parse::<Currency>(),
            Err(PaymentError::UnsupportedCurrency { .. })
        ));
    }

    #[test]
    fn test_order_wire_format() {
        let order = Order {
            session_id: "cart_01.abc".into(),
            amount: 1299,
            currency: Currency::PLN,
            description: "Payment cart_01.abc".into(),
            email: "jan@example.pl".into(),
            country: "PL".into(),
            language: Language::Pl,
            url_return: "https://shop/return".into(),
            url_status: "https://shop/notify".into(),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["sessionId"], "cart_01.abc");
        assert_eq!(value["currency"], "PLN");
        assert_eq!(value["language"], "pl");
        assert_eq!(value["urlStatus"], "https://shop/notify");
    }

    #[test]
    fn test_transaction_status() {
        let details: TransactionDetails = serde_json::from_value(json!({
            "orderId": 31713,
            "sessionId": "cart_01.abc",
            "status": 2,
            "amount": 1299,
            "currency": "PLN",
            "clientEmail": "jan@example.pl"
        }))
        .unwrap();

        assert!(details.is_paid());
        assert_eq!(details.transaction_status(), TransactionStatus::PaymentMade);
        assert_eq!(TransactionStatus::from(3), TransactionStatus::PaymentReturned);
        assert_eq!(TransactionStatus::from(9), TransactionStatus::Unknown(9));
    }

    #[test]
    fn test_notification_verification_fields() {
        let notification: NotificationRequest = serde_json::from_value(json!({
            "merchantId": 1000,
            "posId": 1000,
            "sessionId": "cart_01.abc",
            "amount": 1299,
            "originAmount": 1299,
            "currency": "PLN",
            "orderId": 31713,
            "methodId": 25,
            "statement": "p24-A1-B2",
            "sign": "deadbeef"
        }))
        .unwrap();

        let verification = notification.verification();
        assert_eq!(verification.order_id, 31713);
        assert_eq!(verification.amount, 1299);
    }

    #[test]
    fn test_refund_reason_prefers_message() {
        let result: RefundResult = serde_json::from_value(json!({
            "orderId": 1,
            "sessionId": "s",
            "amount": 100,
            "description": "Zwrot",
            "status": false,
            "message": "Insufficient funds"
        }))
        .unwrap();
        assert_eq!(result.reason(), "Insufficient funds");
    }
}
