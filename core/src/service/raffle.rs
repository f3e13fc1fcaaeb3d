use crate::{
    auth::{AdminSession, constants::MIN_ADMIN_PASSWORD_LEN, hash_password},
    error::{PersistDbError, ServiceError, ServiceResult},
    model::{CreateRaffleRequest, PurchaseInfo, RaffleExport, RaffleInfo, SoldNumbersInfo},
    persist::{
        mapper,
        repo::{self, NewRaffle},
    },
    util::generate_friendly_id,
};
use anyhow::anyhow;
use chrono::Utc;
use entities::raffle;
use log::{info, warn};

use super::RaffleService;

const FRIENDLY_ID_ATTEMPTS: usize = 5;

impl RaffleService {
    pub async fn create_raffle(&self, req: CreateRaffleRequest) -> ServiceResult<RaffleInfo> {
        if req.total_numbers < 1 {
            return Err(ServiceError::InvalidParams(
                "At least one number is required".into(),
            ));
        }
        if req.admin_password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
            return Err(ServiceError::InvalidParams(format!(
                "Password must be at least {MIN_ADMIN_PASSWORD_LEN} characters"
            )));
        }
        let title = req
            .title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        let password_hash = hash_password(&req.admin_password)?;

        for _ in 0..FRIENDLY_ID_ATTEMPTS {
            let new_raffle = NewRaffle {
                title: title.clone(),
                total_numbers: req.total_numbers,
                password_hash: password_hash.clone(),
                friendly_id: generate_friendly_id(),
            };
            match repo::insert_raffle(&self.inner.persist_ctx, new_raffle).await {
                Ok(model) => {
                    info!(
                        "created raffle {} ({:?}) with {} numbers",
                        model.id, model.friendly_id, model.total_numbers
                    );
                    return Ok(mapper::raffle_model_to_info(model));
                }
                Err(PersistDbError::FriendlyIdTaken(id)) => {
                    warn!("friendly id {id} collided, generating another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Other(anyhow!(
            "could not allocate a unique friendly id after {FRIENDLY_ID_ATTEMPTS} attempts"
        )))
    }

    /// Find a raffle by UUID or friendly id.
    pub(crate) async fn load_raffle(&self, raffle_key: &str) -> ServiceResult<raffle::Model> {
        if raffle_key.trim().is_empty() {
            return Err(ServiceError::InvalidParams("raffle id is required".into()));
        }
        Ok(repo::resolve_raffle(&self.inner.persist_ctx, raffle_key).await?)
    }

    pub async fn get_raffle(&self, raffle_key: &str) -> ServiceResult<RaffleInfo> {
        let raffle = self.load_raffle(raffle_key).await?;
        Ok(mapper::raffle_model_to_info(raffle))
    }

    pub async fn sold_numbers(&self, raffle_key: &str) -> ServiceResult<SoldNumbersInfo> {
        let raffle = self.load_raffle(raffle_key).await?;
        let sold = repo::sold_numbers(&self.inner.persist_ctx, &raffle.id).await?;
        let available = i64::from(raffle.total_numbers) - sold.len() as i64;

        Ok(SoldNumbersInfo {
            raffle_id: raffle.id,
            total_numbers: raffle.total_numbers,
            sold: sold.into_iter().collect(),
            available: available.max(0),
        })
    }

    pub async fn list_purchases(&self, session: &AdminSession) -> ServiceResult<Vec<PurchaseInfo>> {
        let rows = repo::list_purchases(&self.inner.persist_ctx, &session.raffle_id).await?;
        rows.into_iter()
            .map(mapper::purchase_model_to_info)
            .collect()
    }

    pub async fn delete_purchase(
        &self,
        session: &AdminSession,
        purchase_id: &str,
    ) -> ServiceResult<()> {
        if purchase_id.trim().is_empty() {
            return Err(ServiceError::InvalidParams("purchase id is required".into()));
        }
        repo::delete_purchase(&self.inner.persist_ctx, &session.raffle_id, purchase_id.trim())
            .await?;
        info!(
            "admin deleted purchase {purchase_id} of raffle {}",
            session.raffle_id
        );
        Ok(())
    }

    pub async fn export_raffle(&self, session: &AdminSession) -> ServiceResult<RaffleExport> {
        let ctx = &self.inner.persist_ctx;
        let raffle = repo::get_raffle(ctx, &session.raffle_id).await?;
        let purchases = repo::list_purchases(ctx, &raffle.id)
            .await?
            .into_iter()
            .map(mapper::purchase_model_to_masked_info)
            .collect::<ServiceResult<Vec<_>>>()?;
        let winners = repo::list_winners(ctx, &raffle.id)
            .await?
            .into_iter()
            .map(mapper::winner_model_to_masked_info)
            .collect();

        Ok(RaffleExport {
            id: raffle.id,
            friendly_id: raffle.friendly_id,
            title: raffle.title,
            total_numbers: raffle.total_numbers,
            purchases,
            winners,
            exported_at: Utc::now(),
        })
    }
}
