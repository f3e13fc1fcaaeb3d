use crate::error::PersistDbError;
use crate::persist::PersistCtx;
use entities::auth_attempt;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use super::common::now;

pub async fn get_auth_attempt(
    ctx: &PersistCtx,
    ip_address: &str,
    raffle_id: &str,
) -> Result<Option<auth_attempt::Model>, PersistDbError> {
    let row = auth_attempt::Entity::find_by_id((ip_address.to_owned(), raffle_id.to_owned()))
        .one(ctx.db.as_ref())
        .await?;
    Ok(row)
}

/// Bump the failure counter for `(ip, raffle)` in a single upsert so that
/// concurrent failures are all counted.
pub async fn record_failed_attempt(
    ctx: &PersistCtx,
    ip_address: &str,
    raffle_id: &str,
) -> Result<auth_attempt::Model, PersistDbError> {
    let ts = now();
    let row = auth_attempt::ActiveModel {
        ip_address: Set(ip_address.to_owned()),
        raffle_id: Set(raffle_id.to_owned()),
        attempt_count: Set(1),
        last_attempt: Set(ts),
        created_at: Set(ts),
    };

    auth_attempt::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                auth_attempt::Column::IpAddress,
                auth_attempt::Column::RaffleId,
            ])
            .value(
                auth_attempt::Column::AttemptCount,
                Expr::col((auth_attempt::Entity, auth_attempt::Column::AttemptCount)).add(1),
            )
            .update_column(auth_attempt::Column::LastAttempt)
            .to_owned(),
        )
        .exec_without_returning(ctx.db.as_ref())
        .await?;

    get_auth_attempt(ctx, ip_address, raffle_id)
        .await?
        .ok_or_else(|| {
            PersistDbError::InvariantViolation(format!(
                "auth attempt row for {ip_address} vanished after upsert"
            ))
        })
}

/// Zero the counter after a successful login. No row means nothing to reset.
pub async fn reset_auth_attempts(
    ctx: &PersistCtx,
    ip_address: &str,
    raffle_id: &str,
) -> Result<(), PersistDbError> {
    auth_attempt::Entity::update_many()
        .col_expr(auth_attempt::Column::AttemptCount, Expr::value(0))
        .col_expr(auth_attempt::Column::LastAttempt, Expr::value(now()))
        .filter(auth_attempt::Column::IpAddress.eq(ip_address))
        .filter(auth_attempt::Column::RaffleId.eq(raffle_id))
        .exec(ctx.db.as_ref())
        .await?;
    Ok(())
}
