use super::{CreateIntentParams, PaymentIntent, PaymentMethod, PaymentProcessorApi, PixQrCode};
use crate::config::StripeConfig;
use crate::error::PaymentProcessorError;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client as HttpClient, Response, Url};
use serde::Deserialize;

const STRIPE_API_VERSION: &str = "2023-10-16";

/// Payment intents over the Stripe REST API.
pub struct StripeClient {
    http: HttpClient,
    api_base: Url,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct RawPaymentIntent {
    id: String,
    status: String,
    client_secret: Option<String>,
    next_action: Option<RawNextAction>,
}

#[derive(Debug, Deserialize)]
struct RawNextAction {
    display_pix_qr_code: Option<PixQrCode>,
}

#[derive(Debug, Deserialize)]
struct RawErrorEnvelope {
    error: RawError,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: Option<String>,
}

impl From<RawPaymentIntent> for PaymentIntent {
    fn from(raw: RawPaymentIntent) -> Self {
        PaymentIntent {
            id: raw.id,
            client_secret: raw.client_secret,
            status: raw.status,
            pix_qr_code: raw.next_action.and_then(|a| a.display_pix_qr_code),
        }
    }
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentProcessorError> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            PaymentProcessorError::InvalidResponse(format!("invalid STRIPE_API_BASE: {e}"))
        })?;
        Ok(Self {
            http: HttpClient::new(),
            api_base,
            secret_key: config.secret_key.clone(),
        })
    }

    fn intents_url(&self, intent_id: Option<&str>) -> Result<Url, PaymentProcessorError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PaymentProcessorError::InvalidResponse("STRIPE_API_BASE cannot be a base".into())
            })?;
            segments.pop_if_empty().extend(["v1", "payment_intents"]);
            if let Some(id) = intent_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn read_intent(response: Response) -> Result<PaymentIntent, PaymentProcessorError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<RawErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.error.message)
                .unwrap_or_else(|| body.clone());
            error!("Stripe request failed with {status}: {message}");
            return Err(PaymentProcessorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawPaymentIntent = serde_json::from_str(&body)
            .map_err(|e| PaymentProcessorError::InvalidResponse(e.to_string()))?;
        Ok(raw.into())
    }
}

pub(crate) fn intent_form(params: &CreateIntentParams) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("amount", params.amount_cents.to_string()),
        ("currency", params.currency.clone()),
        ("metadata[raffleId]", params.raffle_id.clone()),
        ("metadata[numberCount]", params.number_count.to_string()),
        ("metadata[customerName]", params.customer_name.clone()),
    ];
    if let Some(email) = &params.receipt_email {
        form.push(("receipt_email", email.clone()));
    }
    if params.method == PaymentMethod::Pix {
        form.push(("payment_method_types[]", "pix".to_owned()));
        form.push((
            "payment_method_options[pix][expires_after_seconds]",
            params.pix_expires_after_secs.to_string(),
        ));
    }
    form
}

#[async_trait]
impl PaymentProcessorApi for StripeClient {
    async fn create_payment_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        let url = self.intents_url(None)?;
        debug!(
            "creating {} payment intent of {} {} for raffle {}",
            params.method, params.amount_cents, params.currency, params.raffle_id
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&intent_form(params))
            .send()
            .await?;
        Self::read_intent(response).await
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        let url = self.intents_url(Some(intent_id))?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .send()
            .await?;
        Self::read_intent(response).await
    }
}
