use anyhow::Context;
use envconfig::Envconfig;
use std::fmt;

pub const DEFAULT_CURRENCY: &str = "brl";

#[derive(Debug, Clone, Envconfig)]
pub struct ServerConfig {
    #[envconfig(from = "SERVER_HOST", default = "127.0.0.1")]
    pub host: String,

    #[envconfig(from = "SERVER_PORT", default = "3000")]
    pub port: String,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: log::Level,
}

#[derive(Debug, Clone, Envconfig)]
pub struct DatabaseConfig {
    #[envconfig(from = "DATABASE_URL")]
    pub url: String,

    #[envconfig(from = "DATABASE_RUN_MIGRATIONS", default = "true")]
    pub run_migrations: bool,
}

#[derive(Clone, Envconfig)]
pub struct AuthConfig {
    #[envconfig(from = "ADMIN_SESSION_SECRET")]
    pub session_secret: String,

    #[envconfig(from = "ADMIN_SESSION_TTL_SECS", default = "3600")]
    pub session_ttl_secs: i64,

    #[envconfig(from = "ADMIN_COOKIE_SECURE", default = "false")]
    pub cookie_secure: bool,

    #[envconfig(from = "AUTH_MAX_FAILED_ATTEMPTS", default = "5")]
    pub max_failed_attempts: i32,

    #[envconfig(from = "AUTH_LOCKOUT_WINDOW_SECS", default = "3600")]
    pub lockout_window_secs: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("max_failed_attempts", &self.max_failed_attempts)
            .field("lockout_window_secs", &self.lockout_window_secs)
            .finish()
    }
}

#[derive(Clone, Envconfig)]
pub struct StripeConfig {
    #[envconfig(from = "STRIPE_SECRET_KEY")]
    pub secret_key: String,

    #[envconfig(from = "STRIPE_WEBHOOK_SECRET")]
    pub webhook_secret: String,

    #[envconfig(from = "STRIPE_API_BASE", default = "https://api.stripe.com")]
    pub api_base: String,

    #[envconfig(from = "STRIPE_WEBHOOK_TOLERANCE_SECS", default = "300")]
    pub webhook_tolerance_secs: i64,

    #[envconfig(from = "PAYMENT_CURRENCY", default = "brl")]
    pub currency: String,

    #[envconfig(from = "PIX_EXPIRES_AFTER_SECS", default = "3600")]
    pub pix_expires_after_secs: i64,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("currency", &self.currency)
            .field("pix_expires_after_secs", &self.pix_expires_after_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_config: ServerConfig,
    pub database_config: DatabaseConfig,
    pub auth: AuthConfig,
    pub stripe: StripeConfig,
}

impl AppConfig {
    pub fn fetch() -> anyhow::Result<Self> {
        let server_config = ServerConfig::init_from_env().context("failed to load server config")?;
        let database_config =
            DatabaseConfig::init_from_env().context("failed to load database config")?;
        let auth = AuthConfig::init_from_env().context("failed to load auth config")?;
        let stripe = StripeConfig::init_from_env().context("failed to load stripe config")?;

        if auth.session_secret.trim().len() < 32 {
            anyhow::bail!("ADMIN_SESSION_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            server_config,
            database_config,
            auth,
            stripe,
        })
    }
}
