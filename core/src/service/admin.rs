use crate::{
    auth::{AdminSession, verify_password},
    error::{ServiceError, ServiceResult},
    persist::repo,
    util::now_naive,
};
use chrono::Duration;
use entities::auth_attempt;
use log::{info, warn};

use super::RaffleService;

/// Result of a password check that was allowed to run.
#[derive(Debug, Clone)]
pub enum AdminLoginOutcome {
    Granted {
        session: AdminSession,
        token: String,
    },
    Denied,
}

impl AdminLoginOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, AdminLoginOutcome::Granted { .. })
    }
}

impl RaffleService {
    fn is_locked_out(&self, attempt: &auth_attempt::Model) -> bool {
        let auth = &self.inner.config.auth;
        let window_start = now_naive() - Duration::seconds(auth.lockout_window_secs);
        attempt.attempt_count >= auth.max_failed_attempts && attempt.last_attempt > window_start
    }

    /// Check the admin password of a raffle on behalf of `client_ip`.
    ///
    /// A locked-out caller gets `RateLimited` before the password is looked at
    /// and the counter is left alone. A wrong password is not an error: it
    /// bumps the counter and yields [`AdminLoginOutcome::Denied`].
    pub async fn admin_login(
        &self,
        raffle_key: &str,
        password: &str,
        client_ip: &str,
    ) -> ServiceResult<AdminLoginOutcome> {
        if password.is_empty() {
            return Err(ServiceError::InvalidParams("Password is required".into()));
        }
        let raffle = self.load_raffle(raffle_key).await?;
        let ctx = &self.inner.persist_ctx;

        if let Some(attempt) = repo::get_auth_attempt(ctx, client_ip, &raffle.id).await?
            && self.is_locked_out(&attempt)
        {
            warn!(
                "admin login for raffle {} from {client_ip} blocked after {} failures",
                raffle.id, attempt.attempt_count
            );
            return Err(ServiceError::RateLimited);
        }

        if verify_password(password, &raffle.admin_password) {
            repo::reset_auth_attempts(ctx, client_ip, &raffle.id).await?;
            let (session, token) = self.inner.session_signer.issue(&raffle.id);
            info!("admin session opened for raffle {} from {client_ip}", raffle.id);
            return Ok(AdminLoginOutcome::Granted { session, token });
        }

        let attempt = repo::record_failed_attempt(ctx, client_ip, &raffle.id).await?;
        warn!(
            "wrong admin password for raffle {} from {client_ip} (failure {})",
            raffle.id, attempt.attempt_count
        );
        Ok(AdminLoginOutcome::Denied)
    }

    /// Turn a session token presented for `raffle_id` into an [`AdminSession`].
    pub fn authorize_admin(
        &self,
        raffle_id: &str,
        token: Option<&str>,
    ) -> ServiceResult<AdminSession> {
        let token = token
            .ok_or_else(|| ServiceError::Unauthorized("Admin access required".into()))?;
        self.inner
            .session_signer
            .verify(token, raffle_id)
            .ok_or_else(|| ServiceError::Unauthorized("Admin session invalid or expired".into()))
    }
}
