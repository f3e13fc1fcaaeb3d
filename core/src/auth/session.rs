//! Signed admin capability tokens.
//!
//! A token reads `<raffle_id>.<expires_unix>.<hex hmac-sha256>` where the MAC
//! covers `admin:<raffle_id>:<expires_unix>`. Holding a valid token for a
//! raffle is the only way to reach its admin operations.

use super::constants::ADMIN_COOKIE_PREFIX;
use anyhow::anyhow;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Proof that the caller authenticated as admin of `raffle_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub raffle_id: String,
    pub expires_at: i64,
}

pub fn admin_cookie_name(raffle_id: &str) -> String {
    format!("{ADMIN_COOKIE_PREFIX}{raffle_id}")
}

#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
    ttl_secs: i64,
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> anyhow::Result<Self> {
        if ttl_secs <= 0 {
            anyhow::bail!("admin session ttl must be positive");
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("invalid admin session secret: {e}"))?;
        Ok(Self { mac, ttl_secs })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, raffle_id: &str) -> (AdminSession, String) {
        self.issue_at(raffle_id, Utc::now().timestamp())
    }

    pub fn issue_at(&self, raffle_id: &str, now: i64) -> (AdminSession, String) {
        let expires_at = now.saturating_add(self.ttl_secs);
        let token = format!(
            "{raffle_id}.{expires_at}.{}",
            self.signature(raffle_id, expires_at)
        );
        let session = AdminSession {
            raffle_id: raffle_id.to_owned(),
            expires_at,
        };
        (session, token)
    }

    /// Accept `token` only if it is authentic, unexpired and scoped to `raffle_id`.
    pub fn verify(&self, token: &str, raffle_id: &str) -> Option<AdminSession> {
        self.verify_at(token, raffle_id, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, raffle_id: &str, now: i64) -> Option<AdminSession> {
        let mut parts = token.rsplitn(3, '.');
        let signature = parts.next()?;
        let expires_at: i64 = parts.next()?.parse().ok()?;
        let token_raffle = parts.next()?;

        if token_raffle != raffle_id || expires_at <= now {
            return None;
        }

        let expected = self.signature(token_raffle, expires_at);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return None;
        }

        Some(AdminSession {
            raffle_id: token_raffle.to_owned(),
            expires_at,
        })
    }

    fn signature(&self, raffle_id: &str, expires_at: i64) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("admin:{raffle_id}:{expires_at}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
