use crate::{
    auth::AdminSession,
    error::{ServiceError, ServiceResult},
    model::{PurchaseInfo, WinnerInfo},
    persist::{
        mapper,
        repo::{self, NewWinner},
    },
};
use log::info;
use parking_lot::Mutex;
use rand::{Rng, RngCore};
use std::collections::BTreeSet;

use super::RaffleService;

/// Source of the winner index. Injected so draws can be replayed in tests.
pub trait EntropySource: Send + Sync {
    /// An index in `0..len`; `len` is never zero.
    fn pick_index(&self, len: usize) -> usize;
}

pub struct ThreadRngEntropy;

impl EntropySource for ThreadRngEntropy {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

impl<R: RngCore + Send> EntropySource for Mutex<R> {
    fn pick_index(&self, len: usize) -> usize {
        self.lock().gen_range(0..len)
    }
}

/// One sold number together with the purchase that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawEntry {
    pub number: i32,
    pub purchase_id: String,
    pub name: String,
    pub cpf: String,
}

/// Every sold number not yet drawn, ordered by number.
pub fn eligible_entries(purchases: &[PurchaseInfo], drawn: &BTreeSet<i32>) -> Vec<DrawEntry> {
    let mut entries: Vec<DrawEntry> = purchases
        .iter()
        .flat_map(|purchase| {
            purchase
                .numbers
                .iter()
                .filter(|n| !drawn.contains(n))
                .map(|number| DrawEntry {
                    number: *number,
                    purchase_id: purchase.id.clone(),
                    name: purchase.name.clone(),
                    cpf: purchase.cpf.clone(),
                })
        })
        .collect();
    entries.sort_by_key(|e| e.number);
    entries
}

impl RaffleService {
    pub async fn draw_winner(
        &self,
        session: &AdminSession,
        notes: Option<String>,
    ) -> ServiceResult<WinnerInfo> {
        let ctx = &self.inner.persist_ctx;
        let purchases = repo::list_purchases(ctx, &session.raffle_id)
            .await?
            .into_iter()
            .map(mapper::purchase_model_to_info)
            .collect::<ServiceResult<Vec<_>>>()?;
        if purchases.is_empty() {
            return Err(ServiceError::NoPurchases);
        }

        let drawn = repo::drawn_numbers(ctx, &session.raffle_id).await?;
        let entries = eligible_entries(&purchases, &drawn);
        if entries.is_empty() {
            return Err(ServiceError::AllNumbersDrawn);
        }

        let index = self.inner.entropy.pick_index(entries.len()) % entries.len();
        let picked = &entries[index];

        let winner = repo::insert_winner(
            ctx,
            NewWinner {
                raffle_id: session.raffle_id.clone(),
                purchase_id: Some(picked.purchase_id.clone()),
                name: picked.name.clone(),
                cpf: picked.cpf.clone(),
                number: picked.number,
                notes: notes
                    .map(|n| n.trim().to_owned())
                    .filter(|n| !n.is_empty()),
            },
        )
        .await?;

        info!(
            "raffle {} drew number {} ({} of {} eligible)",
            session.raffle_id,
            winner.winning_number,
            index + 1,
            entries.len()
        );
        Ok(mapper::winner_model_to_info(winner))
    }

    /// Public winner history, newest first. CPFs are masked.
    pub async fn list_winners(&self, raffle_key: &str) -> ServiceResult<Vec<WinnerInfo>> {
        let raffle = self.load_raffle(raffle_key).await?;
        let winners = repo::list_winners(&self.inner.persist_ctx, &raffle.id).await?;
        Ok(winners
            .into_iter()
            .map(mapper::winner_model_to_masked_info)
            .collect())
    }
}
