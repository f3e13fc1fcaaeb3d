use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use raffle_service::{
    auth::AdminSession,
    config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StripeConfig},
    error::PaymentProcessorError,
    model::{CreateRaffleRequest, PurchaseInfo, PurchaseRequest, RaffleInfo},
    persist::PersistCtx,
    processor::{CreateIntentParams, PaymentIntent, PaymentMethod, PaymentProcessorApi, PixQrCode},
    service::{EntropySource, RaffleService, ThreadRngEntropy},
};
use sea_orm::ConnectOptions;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const ADMIN_PASSWORD: &str = "correct-horse";
pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";
pub const WEBHOOK_SECRET: &str = "whsec_test_fixture_secret";
pub const BUYER_CPF: &str = "12345678901";

pub fn test_config() -> AppConfig {
    AppConfig {
        server_config: ServerConfig {
            host: "127.0.0.1".into(),
            port: "0".into(),
            log_level: log::Level::Debug,
        },
        database_config: DatabaseConfig {
            url: "sqlite::memory:".into(),
            run_migrations: true,
        },
        auth: AuthConfig {
            session_secret: SESSION_SECRET.into(),
            session_ttl_secs: 3600,
            cookie_secure: false,
            max_failed_attempts: 5,
            lockout_window_secs: 3600,
        },
        stripe: StripeConfig {
            secret_key: "sk_test_fixture".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            api_base: "http://127.0.0.1:9".into(),
            webhook_tolerance_secs: 300,
            currency: "brl".into(),
            pix_expires_after_secs: 3600,
        },
    }
}

/// A migrated in-memory SQLite database. One connection keeps every query on
/// the same database.
pub async fn memory_ctx() -> anyhow::Result<PersistCtx> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let ctx = PersistCtx::connect(options).await?;
    ctx.migrate().await?;
    Ok(ctx)
}

/// Always picks the same index (wrapped into range).
pub struct FixedEntropy(pub usize);

impl EntropySource for FixedEntropy {
    fn pick_index(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// In-memory stand-in for the payment processor.
#[derive(Default)]
pub struct MockProcessor {
    next_id: AtomicU64,
    intents: Mutex<HashMap<String, PaymentIntent>>,
    pub created: Mutex<Vec<CreateIntentParams>>,
}

impl MockProcessor {
    pub fn set_status(&self, intent_id: &str, status: &str) {
        if let Some(intent) = self.intents.lock().get_mut(intent_id) {
            intent.status = status.to_owned();
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

#[async_trait]
impl PaymentProcessorApi for MockProcessor {
    async fn create_payment_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_mock_{n}");
        let (status, pix_qr_code) = match params.method {
            PaymentMethod::Card => ("requires_payment_method", None),
            PaymentMethod::Pix => (
                "requires_action",
                Some(PixQrCode {
                    image_url_png: Some(format!("https://qr.example/{id}.png")),
                    data: Some(format!("00020126pix{id}")),
                }),
            ),
        };
        let intent = PaymentIntent {
            id: id.clone(),
            client_secret: Some(format!("{id}_secret")),
            status: status.to_owned(),
            pix_qr_code,
        };
        self.intents.lock().insert(id, intent.clone());
        self.created.lock().push(params.clone());
        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        self.intents
            .lock()
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentProcessorError::Api {
                status: 404,
                message: format!("No such payment_intent: '{intent_id}'"),
            })
    }
}

pub struct TestApp {
    pub service: RaffleService,
    pub processor: Arc<MockProcessor>,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    setup_with_entropy(Arc::new(ThreadRngEntropy)).await
}

pub async fn setup_with_entropy(entropy: Arc<dyn EntropySource>) -> anyhow::Result<TestApp> {
    let ctx = memory_ctx().await?;
    let processor = Arc::new(MockProcessor::default());
    let service =
        RaffleService::new_with_dependencies(test_config(), ctx, processor.clone(), entropy)?;
    Ok(TestApp { service, processor })
}

pub async fn create_raffle(
    service: &RaffleService,
    total_numbers: i32,
) -> anyhow::Result<RaffleInfo> {
    let raffle = service
        .create_raffle(CreateRaffleRequest {
            title: Some("Test raffle".into()),
            total_numbers,
            admin_password: ADMIN_PASSWORD.into(),
        })
        .await?;
    Ok(raffle)
}

/// An admin session minted directly, skipping the password check.
pub fn admin_session(service: &RaffleService, raffle_id: &str) -> AdminSession {
    service.session_signer().issue(raffle_id).0
}

pub fn purchase_request(name: &str, numbers: Vec<i32>) -> PurchaseRequest {
    PurchaseRequest {
        name: name.into(),
        cpf: BUYER_CPF.into(),
        numbers,
        payment_id: None,
    }
}

pub async fn buy(
    service: &RaffleService,
    raffle_id: &str,
    name: &str,
    numbers: Vec<i32>,
) -> anyhow::Result<PurchaseInfo> {
    service
        .purchase_numbers(raffle_id, purchase_request(name, numbers))
        .await
        .map_err(|e| anyhow!("purchase failed: {e}"))
}
