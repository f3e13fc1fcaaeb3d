use crate::error::PersistDbError;
use crate::persist::PersistCtx;
use entities::{payment, purchase, purchase_number, winner};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JsonValue, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::BTreeSet;

use super::common::{is_unique_violation, new_uuid, now};

pub struct NewPurchase {
    pub raffle_id: String,
    pub name: String,
    pub cpf: String,
    pub numbers: Vec<i32>,
    pub payment_id: Option<String>,
}

pub fn parse_numbers(value: &JsonValue) -> Result<Vec<i32>, PersistDbError> {
    serde_json::from_value(value.clone())
        .map_err(|e| PersistDbError::InvariantViolation(format!("invalid purchase numbers: {e}")))
}

/// The candidates that are already in `sold`, ascending and without repeats.
pub fn conflicting_numbers(candidates: &[i32], sold: &BTreeSet<i32>) -> Vec<i32> {
    candidates
        .iter()
        .filter(|n| sold.contains(n))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Flatten the number lists of every purchase of a raffle.
pub async fn sold_numbers_on<C: ConnectionTrait>(
    conn: &C,
    raffle_id: &str,
) -> Result<BTreeSet<i32>, PersistDbError> {
    let rows = purchase::Entity::find()
        .filter(purchase::Column::RaffleId.eq(raffle_id))
        .all(conn)
        .await?;

    let mut sold = BTreeSet::new();
    for row in rows {
        sold.extend(parse_numbers(&row.numbers)?);
    }
    Ok(sold)
}

pub async fn sold_numbers(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<BTreeSet<i32>, PersistDbError> {
    sold_numbers_on(ctx.db.as_ref(), raffle_id).await
}

/// Record a purchase if none of its numbers is sold yet, optionally binding an
/// unlinked payment of the same raffle.
///
/// The sold-set check and both inserts share one transaction, and each number
/// also lands in `PurchaseNumber`, whose `(raffle_id, number)` key rejects a
/// concurrent buyer that passed the check at the same time.
pub async fn create_purchase(
    ctx: &PersistCtx,
    new_purchase: NewPurchase,
) -> Result<purchase::Model, PersistDbError> {
    let raffle_id = new_purchase.raffle_id.clone();
    let candidates = new_purchase.numbers.clone();

    let result = ctx
        .db
        .transaction(|txn| {
            Box::pin(async move {
                let sold = sold_numbers_on(txn, &new_purchase.raffle_id).await?;
                let taken = conflicting_numbers(&new_purchase.numbers, &sold);
                if !taken.is_empty() {
                    return Err(PersistDbError::NumbersAlreadyPurchased(taken));
                }

                if let Some(payment_id) = &new_purchase.payment_id {
                    let payment = payment::Entity::find_by_id(payment_id)
                        .filter(payment::Column::RaffleId.eq(&new_purchase.raffle_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| PersistDbError::PaymentNotFound(payment_id.clone()))?;
                    if payment.purchase_id.is_some() {
                        return Err(PersistDbError::PaymentAlreadyLinked(payment_id.clone()));
                    }
                }

                let purchase_id = new_uuid();
                let numbers_value = serde_json::to_value(&new_purchase.numbers).map_err(|e| {
                    PersistDbError::InvariantViolation(format!("unserializable numbers: {e}"))
                })?;

                let model = purchase::ActiveModel {
                    id: Set(purchase_id.clone()),
                    raffle_id: Set(new_purchase.raffle_id.clone()),
                    name: Set(new_purchase.name),
                    cpf: Set(new_purchase.cpf),
                    numbers: Set(numbers_value),
                    payment_id: Set(new_purchase.payment_id.clone()),
                    created_at: Set(now()),
                };
                let inserted = model.insert(txn).await?;

                if let Some(payment_id) = &new_purchase.payment_id {
                    payment::Entity::update_many()
                        .filter(payment::Column::Id.eq(payment_id))
                        .col_expr(payment::Column::PurchaseId, Expr::value(purchase_id.clone()))
                        .col_expr(payment::Column::UpdatedAt, Expr::value(now()))
                        .exec(txn)
                        .await?;
                }

                let claims = new_purchase
                    .numbers
                    .iter()
                    .map(|number| purchase_number::ActiveModel {
                        raffle_id: Set(new_purchase.raffle_id.clone()),
                        number: Set(*number),
                        purchase_id: Set(purchase_id.clone()),
                    });
                if !new_purchase.numbers.is_empty() {
                    purchase_number::Entity::insert_many(claims)
                        .exec_without_returning(txn)
                        .await?;
                }

                Ok(inserted)
            })
        })
        .await
        .map_err(PersistDbError::from);

    match result {
        Err(PersistDbError::DatabaseFailure(err)) if is_unique_violation(&err) => {
            let claimed = claimed_numbers(ctx, &raffle_id).await?;
            Err(claim_violation(err, &candidates, &claimed))
        }
        other => other,
    }
}

/// A unique violation is a sale conflict only if some candidate is now
/// claimed; otherwise the store error is passed through.
fn claim_violation(err: DbErr, candidates: &[i32], claimed: &BTreeSet<i32>) -> PersistDbError {
    let taken = conflicting_numbers(candidates, claimed);
    if taken.is_empty() {
        PersistDbError::DatabaseFailure(err)
    } else {
        PersistDbError::NumbersAlreadyPurchased(taken)
    }
}

/// Numbers held in the `PurchaseNumber` claim table for a raffle.
pub async fn claimed_numbers(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<BTreeSet<i32>, PersistDbError> {
    let rows = purchase_number::Entity::find()
        .filter(purchase_number::Column::RaffleId.eq(raffle_id))
        .all(ctx.db.as_ref())
        .await?;
    Ok(rows.into_iter().map(|row| row.number).collect())
}

pub async fn list_purchases(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<Vec<purchase::Model>, PersistDbError> {
    let rows = purchase::Entity::find()
        .filter(purchase::Column::RaffleId.eq(raffle_id))
        .order_by_desc(purchase::Column::CreatedAt)
        .all(ctx.db.as_ref())
        .await?;
    Ok(rows)
}

pub async fn get_purchase(
    ctx: &PersistCtx,
    purchase_id: &str,
) -> Result<purchase::Model, PersistDbError> {
    purchase::Entity::find_by_id(purchase_id)
        .one(ctx.db.as_ref())
        .await?
        .ok_or_else(|| PersistDbError::PurchaseNotFound(purchase_id.to_owned()))
}

/// Remove a purchase and release its numbers. Payments and winners keep their
/// rows but lose the link.
pub async fn delete_purchase(
    ctx: &PersistCtx,
    raffle_id: &str,
    purchase_id: &str,
) -> Result<(), PersistDbError> {
    let raffle_id = raffle_id.to_owned();
    let purchase_id = purchase_id.to_owned();

    ctx.db
        .transaction(|txn| {
            Box::pin(async move {
                let exists = purchase::Entity::find_by_id(&purchase_id)
                    .filter(purchase::Column::RaffleId.eq(&raffle_id))
                    .one(txn)
                    .await?;
                if exists.is_none() {
                    return Err(PersistDbError::PurchaseNotFound(purchase_id));
                }

                purchase_number::Entity::delete_many()
                    .filter(purchase_number::Column::PurchaseId.eq(&purchase_id))
                    .exec(txn)
                    .await?;

                payment::Entity::update_many()
                    .filter(payment::Column::PurchaseId.eq(&purchase_id))
                    .col_expr(payment::Column::PurchaseId, Expr::value(Option::<String>::None))
                    .col_expr(payment::Column::UpdatedAt, Expr::value(now()))
                    .exec(txn)
                    .await?;

                winner::Entity::update_many()
                    .filter(winner::Column::PurchaseId.eq(&purchase_id))
                    .col_expr(winner::Column::PurchaseId, Expr::value(Option::<String>::None))
                    .exec(txn)
                    .await?;

                purchase::Entity::delete_by_id(&purchase_id).exec(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(PersistDbError::from)
}
