use crate::error::PaymentProcessorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod stripe;
pub mod webhook;

pub use stripe::StripeClient;

pub const STATUS_SUCCEEDED: &str = "succeeded";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_REQUIRES_ACTION: &str = "requires_action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Pix,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the processor needs to open a payment intent.
#[derive(Debug, Clone)]
pub struct CreateIntentParams {
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub raffle_id: String,
    pub number_count: i32,
    pub customer_name: String,
    pub receipt_email: Option<String>,
    pub pix_expires_after_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixQrCode {
    pub image_url_png: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub pix_qr_code: Option<PixQrCode>,
}

#[async_trait]
pub trait PaymentProcessorApi: Send + Sync {
    async fn create_payment_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, PaymentProcessorError>;

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentProcessorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_defaults_to_card_and_serializes_lowercase() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
        assert_eq!(serde_json::to_value(PaymentMethod::Pix).unwrap(), "pix");
        assert_eq!(
            serde_json::from_value::<PaymentMethod>(serde_json::json!("card")).unwrap(),
            PaymentMethod::Card
        );
        assert!(serde_json::from_value::<PaymentMethod>(serde_json::json!("boleto")).is_err());
        assert_eq!(PaymentMethod::Pix.to_string(), "pix");
    }
}
