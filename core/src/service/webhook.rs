use crate::{
    error::{ServiceError, ServiceResult},
    persist::repo,
    processor::webhook::{parse_event, status_for_event, verify_signature},
};
use chrono::Utc;
use log::{info, warn};

use super::RaffleService;

impl RaffleService {
    /// Authenticate and apply a Stripe webhook delivery.
    ///
    /// Events that carry no payment status, or that name an intent we never
    /// created, are acknowledged without effect.
    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> ServiceResult<()> {
        let signature = signature.ok_or_else(|| {
            ServiceError::InvalidParams("missing Stripe-Signature header".into())
        })?;
        let stripe_cfg = &self.inner.config.stripe;
        verify_signature(
            &stripe_cfg.webhook_secret,
            payload,
            signature,
            stripe_cfg.webhook_tolerance_secs,
            Utc::now().timestamp(),
        )
        .inspect_err(|e| warn!("rejected webhook delivery: {e}"))?;

        let event = parse_event(payload)?;
        let Some(status) = status_for_event(&event.event_type) else {
            info!("ignoring unhandled webhook event type {}", event.event_type);
            return Ok(());
        };
        let Some(intent_id) = event.object_id() else {
            warn!("webhook event {} carries no payment intent id", event.event_type);
            return Ok(());
        };

        match repo::update_payment_status(&self.inner.persist_ctx, intent_id, status).await? {
            Some(payment) => info!(
                "webhook {}: payment {} ({:?} cents) marked {status}",
                event.event_type,
                payment.id,
                event.object_amount()
            ),
            None => warn!(
                "webhook {} references unknown payment intent {intent_id}",
                event.event_type
            ),
        }
        Ok(())
    }
}
