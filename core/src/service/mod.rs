use crate::{
    auth::SessionSigner,
    config::AppConfig,
    persist::PersistCtx,
    processor::{PaymentProcessorApi, StripeClient},
};
use log::info;
use std::sync::Arc;

mod admin;
mod draw;
mod payment;
mod purchase;
mod raffle;
mod webhook;

pub use admin::AdminLoginOutcome;
pub use draw::{DrawEntry, EntropySource, ThreadRngEntropy, eligible_entries};
pub use purchase::validate_purchase_request;

pub struct Inner {
    config: AppConfig,
    persist_ctx: PersistCtx,
    processor: Arc<dyn PaymentProcessorApi>,
    session_signer: SessionSigner,
    entropy: Arc<dyn EntropySource>,
}

#[derive(Clone)]
pub struct RaffleService {
    inner: Arc<Inner>,
}

impl RaffleService {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let persist_ctx = PersistCtx::new(&config.database_config).await?;
        if config.database_config.run_migrations {
            persist_ctx.migrate().await?;
            info!("database migrations applied");
        }

        let processor = Arc::new(StripeClient::new(&config.stripe)?);
        Self::new_with_dependencies(config, persist_ctx, processor, Arc::new(ThreadRngEntropy))
    }

    pub fn new_with_dependencies(
        config: AppConfig,
        persist_ctx: PersistCtx,
        processor: Arc<dyn PaymentProcessorApi>,
        entropy: Arc<dyn EntropySource>,
    ) -> anyhow::Result<Self> {
        let session_signer =
            SessionSigner::new(&config.auth.session_secret, config.auth.session_ttl_secs)?;

        let inner = Inner {
            config,
            persist_ctx,
            processor,
            session_signer,
            entropy,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn persist_ctx(&self) -> &PersistCtx {
        &self.inner.persist_ctx
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn session_signer(&self) -> &SessionSigner {
        &self.inner.session_signer
    }
}
