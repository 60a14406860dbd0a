//! # Signatures
//!
//! Przelewy24 signs with SHA-384 over a compact JSON object whose last field is the
//! CRC key. Field order is part of the contract.

use crate::types::{Currency, NotificationRequest, Order, Verification};
use pay_core::{PaymentError, PaymentResult};
use serde::Serialize;
use sha2::{Digest, Sha384};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterSign<'a> {
    session_id: &'a str,
    merchant_id: u64,
    amount: i64,
    currency: Currency,
    crc: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifySign<'a> {
    session_id: &'a str,
    order_id: i64,
    amount: i64,
    currency: Currency,
    crc: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationSign<'a> {
    merchant_id: u64,
    pos_id: u64,
    session_id: &'a str,
    amount: i64,
    origin_amount: i64,
    currency: Currency,
    order_id: i64,
    method_id: i64,
    statement: &'a str,
    crc: &'a str,
}

fn sha384_json<T: Serialize>(fields: &T) -> PaymentResult<String> {
    let json = serde_json::to_string(fields)
        .map_err(|e| PaymentError::Serialization(format!("failed to encode signature: {}", e)))?;
    Ok(hex::encode(Sha384::digest(json.as_bytes())))
}

/// Signature of a transaction registration
pub fn register_signature(order: &Order, merchant_id: u64, crc: &str) -> PaymentResult<String> {
    sha384_json(&RegisterSign {
        session_id: &order.session_id,
        merchant_id,
        amount: order.amount,
        currency: order.currency,
        crc,
    })
}

/// Signature of a transaction verification
pub fn verify_signature(verification: &Verification, crc: &str) -> PaymentResult<String> {
    sha384_json(&VerifySign {
        session_id: &verification.session_id,
        order_id: verification.order_id,
        amount: verification.amount,
        currency: verification.currency,
        crc,
    })
}

/// Expected signature of an inbound notification
pub fn notification_signature(
    notification: &NotificationRequest,
    crc: &str,
) -> PaymentResult<String> {
    sha384_json(&NotificationSign {
        merchant_id: notification.merchant_id,
        pos_id: notification.pos_id,
        session_id: &notification.session_id,
        amount: notification.amount,
        origin_amount: notification.origin_amount,
        currency: notification.currency,
        order_id: notification.order_id,
        method_id: notification.method_id,
        statement: &notification.statement,
        crc,
    })
}

pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> NotificationRequest {
        NotificationRequest {
            merchant_id: 1000,
            pos_id: 1000,
            session_id: "cart_01.abc".into(),
            amount: 1299,
            origin_amount: 1299,
            currency: Currency::PLN,
            order_id: 31713,
            method_id: 25,
            statement: "p24-A1-B2".into(),
            sign: String::new(),
        }
    }

    #[test]
    fn test_signed_json_layout() {
        let json = serde_json::to_string(&VerifySign {
            session_id: "s/1",
            order_id: 7,
            amount: 100,
            currency: Currency::PLN,
            crc: "crc",
        })
        .unwrap();

        assert_eq!(
            json,
            r#"{"sessionId":"s/1","orderId":7,"amount":100,"currency":"PLN","crc":"crc"}"#
        );
    }

    #[test]
    fn test_signature_is_sha384_hex() {
        let sig = notification_signature(&notification(), "crc").unwrap();
        assert_eq!(sig.len(), 96);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_depends_on_crc_and_fields() {
        let base = notification_signature(&notification(), "crc").unwrap();
        assert_ne!(base, notification_signature(&notification(), "other").unwrap());

        let mut tampered = notification();
        tampered.amount = 1;
        assert_ne!(base, notification_signature(&tampered, "crc").unwrap());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
