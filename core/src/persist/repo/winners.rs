use crate::error::PersistDbError;
use crate::persist::PersistCtx;
use entities::winner;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::BTreeSet;

use super::common::{is_unique_violation, new_uuid, now};

pub struct NewWinner {
    pub raffle_id: String,
    pub purchase_id: Option<String>,
    pub name: String,
    pub cpf: String,
    pub number: i32,
    pub notes: Option<String>,
}

pub async fn drawn_numbers_on<C: ConnectionTrait>(
    conn: &C,
    raffle_id: &str,
) -> Result<BTreeSet<i32>, PersistDbError> {
    let rows = winner::Entity::find()
        .filter(winner::Column::RaffleId.eq(raffle_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|w| w.winning_number).collect())
}

pub async fn drawn_numbers(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<BTreeSet<i32>, PersistDbError> {
    drawn_numbers_on(ctx.db.as_ref(), raffle_id).await
}

/// Insert a winner row. The `(raffle_id, winning_number)` unique index turns a
/// second draw of the same number into `NumberAlreadyDrawn`.
pub async fn insert_winner(
    ctx: &PersistCtx,
    new_winner: NewWinner,
) -> Result<winner::Model, PersistDbError> {
    let number = new_winner.number;
    let model = winner::ActiveModel {
        id: Set(new_uuid()),
        raffle_id: Set(new_winner.raffle_id),
        purchase_id: Set(new_winner.purchase_id),
        winner_name: Set(new_winner.name),
        winner_cpf: Set(new_winner.cpf),
        winning_number: Set(number),
        drawn_at: Set(now()),
        notes: Set(new_winner.notes),
    };

    model.insert(ctx.db.as_ref()).await.map_err(|err| {
        if is_unique_violation(&err) {
            PersistDbError::NumberAlreadyDrawn(number)
        } else {
            PersistDbError::DatabaseFailure(err)
        }
    })
}

pub async fn list_winners(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<Vec<winner::Model>, PersistDbError> {
    let rows = winner::Entity::find()
        .filter(winner::Column::RaffleId.eq(raffle_id))
        .order_by_desc(winner::Column::DrawnAt)
        .all(ctx.db.as_ref())
        .await?;
    Ok(rows)
}
