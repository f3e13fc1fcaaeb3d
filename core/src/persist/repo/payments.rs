use crate::error::PersistDbError;
use crate::persist::PersistCtx;
use entities::{payment, purchase};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::common::{new_uuid, now};

pub struct NewPayment {
    pub raffle_id: String,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

pub async fn insert_payment(
    ctx: &PersistCtx,
    new_payment: NewPayment,
) -> Result<payment::Model, PersistDbError> {
    let ts = now();
    let model = payment::ActiveModel {
        id: Set(new_uuid()),
        raffle_id: Set(new_payment.raffle_id),
        purchase_id: Set(None),
        payment_intent_id: Set(new_payment.payment_intent_id),
        amount: Set(new_payment.amount),
        currency: Set(new_payment.currency),
        status: Set(new_payment.status),
        payment_method: Set(new_payment.payment_method),
        customer_name: Set(new_payment.customer_name),
        customer_email: Set(new_payment.customer_email),
        created_at: Set(ts),
        updated_at: Set(ts),
    };
    Ok(model.insert(ctx.db.as_ref()).await?)
}

pub async fn get_payment(
    ctx: &PersistCtx,
    payment_id: &str,
) -> Result<payment::Model, PersistDbError> {
    payment::Entity::find_by_id(payment_id)
        .one(ctx.db.as_ref())
        .await?
        .ok_or_else(|| PersistDbError::PaymentNotFound(payment_id.to_owned()))
}

pub async fn find_payment_by_intent(
    ctx: &PersistCtx,
    payment_intent_id: &str,
) -> Result<Option<payment::Model>, PersistDbError> {
    let row = payment::Entity::find()
        .filter(payment::Column::PaymentIntentId.eq(payment_intent_id))
        .one(ctx.db.as_ref())
        .await?;
    Ok(row)
}

pub async fn get_payment_by_intent(
    ctx: &PersistCtx,
    payment_intent_id: &str,
) -> Result<payment::Model, PersistDbError> {
    find_payment_by_intent(ctx, payment_intent_id)
        .await?
        .ok_or_else(|| PersistDbError::PaymentNotFound(payment_intent_id.to_owned()))
}

/// Overwrite the status of the payment tracking `payment_intent_id`.
/// Returns `None` when no payment tracks that intent.
pub async fn update_payment_status(
    ctx: &PersistCtx,
    payment_intent_id: &str,
    status: &str,
) -> Result<Option<payment::Model>, PersistDbError> {
    let Some(existing) = find_payment_by_intent(ctx, payment_intent_id).await? else {
        return Ok(None);
    };

    let mut active = existing.into_active_model();
    active.status = Set(status.to_owned());
    active.updated_at = Set(now());
    Ok(Some(active.update(ctx.db.as_ref()).await?))
}

/// Point the payment and the purchase at each other in one transaction.
/// Either side already linked to something else is a conflict.
pub async fn link_payment_to_purchase(
    ctx: &PersistCtx,
    payment_id: &str,
    purchase_id: &str,
) -> Result<payment::Model, PersistDbError> {
    let payment_id = payment_id.to_owned();
    let purchase_id = purchase_id.to_owned();

    ctx.db
        .transaction(|txn| {
            Box::pin(async move {
                let payment = payment::Entity::find_by_id(&payment_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| PersistDbError::PaymentNotFound(payment_id.clone()))?;
                let purchase = purchase::Entity::find_by_id(&purchase_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| PersistDbError::PurchaseNotFound(purchase_id.clone()))?;

                // Relinking the same pair is allowed.
                if payment
                    .purchase_id
                    .as_ref()
                    .is_some_and(|linked| *linked != purchase_id)
                {
                    return Err(PersistDbError::PaymentAlreadyLinked(payment_id.clone()));
                }
                if purchase
                    .payment_id
                    .as_ref()
                    .is_some_and(|linked| *linked != payment_id)
                {
                    return Err(PersistDbError::PurchaseAlreadyLinked(purchase_id.clone()));
                }

                let mut purchase = purchase.into_active_model();
                purchase.payment_id = Set(Some(payment_id.clone()));
                purchase.update(txn).await?;

                let mut payment = payment.into_active_model();
                payment.purchase_id = Set(Some(purchase_id.clone()));
                payment.updated_at = Set(now());
                Ok::<_, PersistDbError>(payment.update(txn).await?)
            })
        })
        .await
        .map_err(PersistDbError::from)
}

pub async fn list_payments(
    ctx: &PersistCtx,
    raffle_id: &str,
) -> Result<Vec<payment::Model>, PersistDbError> {
    let rows = payment::Entity::find()
        .filter(payment::Column::RaffleId.eq(raffle_id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(ctx.db.as_ref())
        .await?;
    Ok(rows)
}
