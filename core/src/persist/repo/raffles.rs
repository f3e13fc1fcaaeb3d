use crate::error::PersistDbError;
use crate::persist::PersistCtx;
use crate::util::looks_like_friendly_id;
use entities::raffle;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use super::common::{is_unique_violation, is_uuid, new_uuid, now};

pub struct NewRaffle {
    pub title: Option<String>,
    pub total_numbers: i32,
    pub password_hash: String,
    pub friendly_id: String,
}

pub async fn insert_raffle(
    ctx: &PersistCtx,
    new_raffle: NewRaffle,
) -> Result<raffle::Model, PersistDbError> {
    let friendly_id = new_raffle.friendly_id.clone();
    let model = raffle::ActiveModel {
        id: Set(new_uuid()),
        title: Set(new_raffle.title),
        total_numbers: Set(new_raffle.total_numbers),
        admin_password: Set(new_raffle.password_hash),
        friendly_id: Set(Some(new_raffle.friendly_id)),
        created_at: Set(now()),
    };

    model.insert(ctx.db.as_ref()).await.map_err(|err| {
        if is_unique_violation(&err) {
            PersistDbError::FriendlyIdTaken(friendly_id)
        } else {
            PersistDbError::DatabaseFailure(err)
        }
    })
}

pub async fn get_raffle(ctx: &PersistCtx, raffle_id: &str) -> Result<raffle::Model, PersistDbError> {
    raffle::Entity::find_by_id(raffle_id)
        .one(ctx.db.as_ref())
        .await?
        .ok_or_else(|| PersistDbError::RaffleNotFound(raffle_id.to_owned()))
}

pub async fn find_raffle_by_friendly_id(
    ctx: &PersistCtx,
    friendly_id: &str,
) -> Result<Option<raffle::Model>, PersistDbError> {
    let row = raffle::Entity::find()
        .filter(raffle::Column::FriendlyId.eq(friendly_id.trim().to_ascii_uppercase()))
        .one(ctx.db.as_ref())
        .await?;
    Ok(row)
}

/// Look a raffle up by its UUID or, failing that, by its friendly id.
pub async fn resolve_raffle(ctx: &PersistCtx, key: &str) -> Result<raffle::Model, PersistDbError> {
    let key = key.trim();
    if is_uuid(key) {
        return get_raffle(ctx, &key.to_ascii_lowercase()).await;
    }
    if !looks_like_friendly_id(key) {
        return Err(PersistDbError::RaffleNotFound(key.to_owned()));
    }
    find_raffle_by_friendly_id(ctx, key)
        .await?
        .ok_or_else(|| PersistDbError::RaffleNotFound(key.to_owned()))
}
