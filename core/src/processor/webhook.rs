//! Stripe webhook authentication and event decoding.

use super::{STATUS_FAILED, STATUS_PROCESSING, STATUS_REQUIRES_ACTION, STATUS_SUCCEEDED};
use crate::error::PaymentProcessorError;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

impl WebhookEvent {
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }

    pub fn object_amount(&self) -> Option<i64> {
        self.data.object.get("amount").and_then(Value::as_i64)
    }
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PaymentProcessorError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Payment status carried by a payment intent event, `None` for events we ignore.
pub fn status_for_event(event_type: &str) -> Option<&'static str> {
    match event_type {
        "payment_intent.succeeded" => Some(STATUS_SUCCEEDED),
        "payment_intent.payment_failed" => Some(STATUS_FAILED),
        "payment_intent.processing" => Some(STATUS_PROCESSING),
        "payment_intent.requires_action" => Some(STATUS_REQUIRES_ACTION),
        _ => None,
    }
}

fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, PaymentProcessorError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentProcessorError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a `Stripe-Signature` value for `payload`, as Stripe would send it.
pub fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, PaymentProcessorError> {
    Ok(format!(
        "t={timestamp},v1={}",
        compute_signature(secret, timestamp, payload)?
    ))
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against
/// the raw request body.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), PaymentProcessorError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentProcessorError::InvalidSignature("missing or malformed timestamp".into())
    })?;
    if candidates.is_empty() {
        return Err(PaymentProcessorError::InvalidSignature(
            "no v1 signature present".into(),
        ));
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(PaymentProcessorError::InvalidSignature(
            "timestamp outside the tolerance window".into(),
        ));
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    let matched = candidates
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
    if !matched {
        return Err(PaymentProcessorError::InvalidSignature(
            "signature mismatch".into(),
        ));
    }
    Ok(())
}
