//! API-facing representations of the stored rows.

use crate::processor::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaffleInfo {
    pub id: String,
    pub friendly_id: Option<String>,
    pub title: Option<String>,
    pub total_numbers: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoldNumbersInfo {
    pub raffle_id: String,
    pub total_numbers: i32,
    pub sold: Vec<i32>,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseInfo {
    pub id: String,
    pub raffle_id: String,
    pub name: String,
    pub cpf: String,
    pub numbers: Vec<i32>,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentInfo {
    pub id: String,
    pub raffle_id: String,
    pub purchase_id: Option<String>,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnerInfo {
    pub id: String,
    pub raffle_id: String,
    pub purchase_id: Option<String>,
    pub name: String,
    pub cpf: String,
    pub number: i32,
    pub drawn_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentStats {
    pub total_amount: i64,
    pub successful_payments: usize,
    pub failed_payments: usize,
    pub pending_payments: usize,
    pub currency: String,
}

/// Admin download of a raffle; buyer CPFs are masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleExport {
    pub id: String,
    pub friendly_id: Option<String>,
    pub title: Option<String>,
    pub total_numbers: i32,
    pub purchases: Vec<PurchaseInfo>,
    pub winners: Vec<WinnerInfo>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRaffleRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub total_numbers: i32,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub name: String,
    pub cpf: String,
    pub numbers: Vec<i32>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawWinnerRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub amount: i64,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub number_count: i32,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixInfo {
    pub qr_code: Option<String>,
    pub qr_code_data: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentResult {
    pub client_secret: Option<String>,
    pub payment_id: String,
    pub payment_intent_id: String,
    pub payment_method: PaymentMethod,
    pub pix_info: Option<PixInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentStatusResult {
    pub status: String,
    pub is_paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkPaymentRequest {
    pub purchase_id: String,
}
