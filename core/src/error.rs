use crate::util::join_numbers;
use anyhow::anyhow;
use sea_orm::TransactionError as SeaTransactionError;
use thiserror::Error;

// ---------- SeaORM transaction error conversions ----------

impl From<SeaTransactionError<PersistDbError>> for PersistDbError {
    fn from(err: SeaTransactionError<PersistDbError>) -> Self {
        match err {
            SeaTransactionError::Connection(db_err) => PersistDbError::DatabaseFailure(db_err),
            SeaTransactionError::Transaction(inner) => inner,
        }
    }
}

// ---------- Domain/Layer error types ----------

#[derive(Debug, Error)]
pub enum PersistDbError {
    #[error("Database operation failed: {0}")]
    DatabaseFailure(#[from] sea_orm::DbErr),

    #[error("Raffle not found: {0}")]
    RaffleNotFound(String),

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Numbers {} are already purchased", join_numbers(.0))]
    NumbersAlreadyPurchased(Vec<i32>),

    #[error("Payment {0} is already linked to a purchase")]
    PaymentAlreadyLinked(String),

    #[error("Purchase {0} is already linked to a payment")]
    PurchaseAlreadyLinked(String),

    #[error("Number {0} was already drawn")]
    NumberAlreadyDrawn(i32),

    #[error("Friendly id already taken: {0}")]
    FriendlyIdTaken(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum PaymentProcessorError {
    #[error("payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment processor rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment processor response: {0}")]
    InvalidResponse(String),

    #[error("webhook signature invalid: {0}")]
    InvalidSignature(String),

    #[error("malformed webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("too many failed attempts")]
    RateLimited,

    #[error("no purchases found for this raffle")]
    NoPurchases,

    #[error("all purchased numbers have already been drawn")]
    AllNumbersDrawn,

    #[error("payment processor error: {0}")]
    PaymentProcessor(PaymentProcessorError),

    #[error("database error: {0}")]
    Db(PersistDbError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<PersistDbError> for ServiceError {
    fn from(e: PersistDbError) -> Self {
        match e {
            PersistDbError::RaffleNotFound(raffle) => {
                ServiceError::NotFound(format!("Raffle {raffle} not found"))
            }
            PersistDbError::PurchaseNotFound(purchase) => {
                ServiceError::NotFound(format!("Purchase {purchase} not found"))
            }
            PersistDbError::PaymentNotFound(payment) => {
                ServiceError::NotFound(format!("Payment {payment} not found"))
            }
            err @ PersistDbError::NumbersAlreadyPurchased(_) => {
                ServiceError::Conflict(err.to_string())
            }
            err @ PersistDbError::NumberAlreadyDrawn(_) => ServiceError::Conflict(err.to_string()),
            err @ (PersistDbError::PaymentAlreadyLinked(_)
            | PersistDbError::PurchaseAlreadyLinked(_)) => ServiceError::Conflict(err.to_string()),
            PersistDbError::FriendlyIdTaken(id) => {
                ServiceError::Conflict(format!("friendly id {id} already taken"))
            }
            PersistDbError::InvariantViolation(msg) => ServiceError::Other(anyhow!(msg)),
            PersistDbError::DatabaseFailure(e) => {
                ServiceError::Db(PersistDbError::DatabaseFailure(e))
            }
        }
    }
}

impl From<PaymentProcessorError> for ServiceError {
    fn from(e: PaymentProcessorError) -> Self {
        match e {
            PaymentProcessorError::InvalidSignature(_) | PaymentProcessorError::InvalidPayload(_) => {
                ServiceError::InvalidParams(e.to_string())
            }
            other => ServiceError::PaymentProcessor(other),
        }
    }
}
