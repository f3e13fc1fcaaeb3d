use crate::{
    auth::AdminSession,
    config::DEFAULT_CURRENCY,
    error::{ServiceError, ServiceResult},
    model::{
        CreatePaymentIntentRequest, CreatePaymentIntentResult, PaymentInfo, PaymentStats,
        PaymentStatusResult, PixInfo,
    },
    persist::{
        mapper,
        repo::{self, NewPayment},
    },
    processor::{CreateIntentParams, PaymentMethod, STATUS_FAILED, STATUS_SUCCEEDED},
};
use chrono::{Duration, Utc};
use log::{info, warn};

use super::RaffleService;

fn validate_intent_request(req: &CreatePaymentIntentRequest) -> ServiceResult<()> {
    if req.amount <= 0 {
        return Err(ServiceError::InvalidParams("Amount must be positive".into()));
    }
    if req.customer_name.trim().is_empty() {
        return Err(ServiceError::InvalidParams("Name is required".into()));
    }
    if let Some(email) = &req.customer_email
        && !email.contains('@')
    {
        return Err(ServiceError::InvalidParams("A valid email is required".into()));
    }
    if req.number_count <= 0 {
        return Err(ServiceError::InvalidParams(
            "Number count must be positive".into(),
        ));
    }
    Ok(())
}

/// Totals over a raffle's payments. `pending` is everything that neither
/// succeeded nor failed.
pub(crate) fn summarize_payments(payments: &[PaymentInfo]) -> PaymentStats {
    let succeeded = payments.iter().filter(|p| p.status == STATUS_SUCCEEDED);
    let total_amount = succeeded.clone().map(|p| p.amount).sum();
    let successful_payments = succeeded.count();
    let failed_payments = payments
        .iter()
        .filter(|p| p.status == STATUS_FAILED)
        .count();

    PaymentStats {
        total_amount,
        successful_payments,
        failed_payments,
        pending_payments: payments.len() - successful_payments - failed_payments,
        currency: payments
            .first()
            .map(|p| p.currency.clone())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
    }
}

impl RaffleService {
    pub async fn create_payment_intent(
        &self,
        raffle_key: &str,
        req: CreatePaymentIntentRequest,
    ) -> ServiceResult<CreatePaymentIntentResult> {
        validate_intent_request(&req)?;
        let raffle = self.load_raffle(raffle_key).await?;
        let stripe_cfg = &self.inner.config.stripe;
        let method = req.payment_method.unwrap_or_default();
        let amount_cents = req
            .amount
            .checked_mul(100)
            .ok_or_else(|| ServiceError::InvalidParams("Amount is too large".into()))?;
        let customer_email = req
            .customer_email
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        let params = CreateIntentParams {
            amount_cents,
            currency: stripe_cfg.currency.clone(),
            method,
            raffle_id: raffle.id.clone(),
            number_count: req.number_count,
            customer_name: req.customer_name.trim().to_owned(),
            receipt_email: customer_email.clone(),
            pix_expires_after_secs: stripe_cfg.pix_expires_after_secs,
        };
        let intent = self.inner.processor.create_payment_intent(&params).await?;

        let payment = repo::insert_payment(
            &self.inner.persist_ctx,
            NewPayment {
                raffle_id: raffle.id.clone(),
                payment_intent_id: intent.id.clone(),
                amount: req.amount,
                currency: stripe_cfg.currency.clone(),
                status: intent.status.clone(),
                payment_method: method.as_str().to_owned(),
                customer_name: Some(params.customer_name),
                customer_email,
            },
        )
        .await?;

        let pix_info = match (method, intent.pix_qr_code) {
            (PaymentMethod::Pix, Some(qr)) => Some(PixInfo {
                qr_code: qr.image_url_png,
                qr_code_data: qr.data,
                expires_at: Utc::now() + Duration::seconds(stripe_cfg.pix_expires_after_secs),
            }),
            _ => None,
        };

        info!(
            "payment {} ({method}, intent {}) created for raffle {}",
            payment.id, intent.id, raffle.id
        );

        Ok(CreatePaymentIntentResult {
            client_secret: intent.client_secret,
            payment_id: payment.id,
            payment_intent_id: intent.id,
            payment_method: method,
            pix_info,
        })
    }

    pub async fn get_payment(&self, payment_id: &str) -> ServiceResult<PaymentInfo> {
        let payment = repo::get_payment(&self.inner.persist_ctx, payment_id.trim()).await?;
        Ok(mapper::payment_model_to_info(payment))
    }

    pub async fn get_payment_by_intent(&self, intent_id: &str) -> ServiceResult<PaymentInfo> {
        let payment =
            repo::get_payment_by_intent(&self.inner.persist_ctx, intent_id.trim()).await?;
        Ok(mapper::payment_model_to_info(payment))
    }

    pub async fn update_payment_status(
        &self,
        intent_id: &str,
        status: &str,
    ) -> ServiceResult<PaymentInfo> {
        let updated = repo::update_payment_status(&self.inner.persist_ctx, intent_id, status)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Payment for intent {intent_id} not found"))
            })?;
        info!("payment {} is now {status}", updated.id);
        Ok(mapper::payment_model_to_info(updated))
    }

    /// Ask the processor for the current intent status and record a success.
    pub async fn refresh_payment_status(&self, intent_id: &str) -> ServiceResult<PaymentStatusResult> {
        let intent_id = intent_id.trim();
        if intent_id.is_empty() {
            return Err(ServiceError::InvalidParams(
                "payment intent id is required".into(),
            ));
        }
        let intent = self.inner.processor.retrieve_payment_intent(intent_id).await?;
        let is_paid = intent.status == STATUS_SUCCEEDED;
        if is_paid {
            self.update_payment_status(intent_id, STATUS_SUCCEEDED)
                .await?;
        }
        Ok(PaymentStatusResult {
            status: intent.status,
            is_paid,
        })
    }

    pub async fn link_payment_to_purchase(
        &self,
        payment_id: &str,
        purchase_id: &str,
    ) -> ServiceResult<PaymentInfo> {
        let ctx = &self.inner.persist_ctx;
        let payment = repo::get_payment(ctx, payment_id.trim()).await?;
        let purchase = repo::get_purchase(ctx, purchase_id.trim()).await?;
        if payment.raffle_id != purchase.raffle_id {
            warn!(
                "refusing to link payment {} and purchase {} across raffles",
                payment.id, purchase.id
            );
            return Err(ServiceError::InvalidParams(
                "payment and purchase belong to different raffles".into(),
            ));
        }

        let linked = repo::link_payment_to_purchase(ctx, &payment.id, &purchase.id).await?;
        Ok(mapper::payment_model_to_info(linked))
    }

    pub async fn list_payments(&self, session: &AdminSession) -> ServiceResult<Vec<PaymentInfo>> {
        let rows = repo::list_payments(&self.inner.persist_ctx, &session.raffle_id).await?;
        Ok(rows.into_iter().map(mapper::payment_model_to_info).collect())
    }

    pub async fn payment_stats(&self, session: &AdminSession) -> ServiceResult<PaymentStats> {
        let payments = self.list_payments(session).await?;
        Ok(summarize_payments(&payments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: &str, amount: i64, currency: &str) -> PaymentInfo {
        let now = Utc::now();
        PaymentInfo {
            id: format!("p-{status}-{amount}"),
            raffle_id: "r".into(),
            purchase_id: None,
            payment_intent_id: format!("pi_{status}_{amount}"),
            amount,
            currency: currency.into(),
            status: status.into(),
            payment_method: "card".into(),
            customer_name: None,
            customer_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_sum_only_successful_payments() {
        let stats = summarize_payments(&[
            payment("succeeded", 30, "usd"),
            payment("failed", 10, "brl"),
            payment("succeeded", 20, "brl"),
            payment("requires_action", 5, "brl"),
            payment("processing", 7, "brl"),
        ]);
        assert_eq!(stats.total_amount, 50);
        assert_eq!(stats.successful_payments, 2);
        assert_eq!(stats.failed_payments, 1);
        assert_eq!(stats.pending_payments, 2);
        assert_eq!(stats.currency, "usd");
    }

    #[test]
    fn empty_stats_default_to_brl() {
        let stats = summarize_payments(&[]);
        assert_eq!(stats.total_amount, 0);
        assert_eq!(stats.pending_payments, 0);
        assert_eq!(stats.currency, "brl");
    }

    #[test]
    fn intent_requests_are_validated() {
        let ok = CreatePaymentIntentRequest {
            amount: 25,
            customer_name: "Ana".into(),
            customer_email: Some("ana@example.com".into()),
            number_count: 5,
            payment_method: None,
        };
        validate_intent_request(&ok).unwrap();

        let mut bad = ok.clone();
        bad.amount = 0;
        assert!(validate_intent_request(&bad).is_err());

        let mut bad = ok.clone();
        bad.customer_email = Some("not-an-email".into());
        assert!(validate_intent_request(&bad).is_err());

        let mut bad = ok.clone();
        bad.number_count = 0;
        assert!(validate_intent_request(&bad).is_err());

        let mut bad = ok;
        bad.customer_name = " ".into();
        assert!(validate_intent_request(&bad).is_err());
    }
}
