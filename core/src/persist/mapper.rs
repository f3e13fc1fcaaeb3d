use crate::error::{ServiceError, ServiceResult};
use crate::model::{PaymentInfo, PurchaseInfo, RaffleInfo, WinnerInfo};
use crate::persist::repo::parse_numbers;
use crate::util::mask_cpf;
use entities::{payment, purchase, raffle, winner};

pub fn raffle_model_to_info(raffle: raffle::Model) -> RaffleInfo {
    RaffleInfo {
        id: raffle.id,
        friendly_id: raffle.friendly_id,
        title: raffle.title,
        total_numbers: raffle.total_numbers,
        created_at: raffle.created_at.and_utc(),
    }
}

pub fn purchase_model_to_info(purchase: purchase::Model) -> ServiceResult<PurchaseInfo> {
    let numbers = parse_numbers(&purchase.numbers).map_err(ServiceError::from)?;
    Ok(PurchaseInfo {
        id: purchase.id,
        raffle_id: purchase.raffle_id,
        name: purchase.name,
        cpf: purchase.cpf,
        numbers,
        payment_id: purchase.payment_id,
        created_at: purchase.created_at.and_utc(),
    })
}

/// Same as [`purchase_model_to_info`] with the CPF masked, for exports.
pub fn purchase_model_to_masked_info(purchase: purchase::Model) -> ServiceResult<PurchaseInfo> {
    let mut info = purchase_model_to_info(purchase)?;
    info.cpf = mask_cpf(&info.cpf);
    Ok(info)
}

pub fn payment_model_to_info(payment: payment::Model) -> PaymentInfo {
    PaymentInfo {
        id: payment.id,
        raffle_id: payment.raffle_id,
        purchase_id: payment.purchase_id,
        payment_intent_id: payment.payment_intent_id,
        amount: payment.amount,
        currency: payment.currency,
        status: payment.status,
        payment_method: payment.payment_method,
        customer_name: payment.customer_name,
        customer_email: payment.customer_email,
        created_at: payment.created_at.and_utc(),
        updated_at: payment.updated_at.and_utc(),
    }
}

pub fn winner_model_to_info(winner: winner::Model) -> WinnerInfo {
    WinnerInfo {
        id: winner.id,
        raffle_id: winner.raffle_id,
        purchase_id: winner.purchase_id,
        name: winner.winner_name,
        cpf: winner.winner_cpf,
        number: winner.winning_number,
        drawn_at: winner.drawn_at.and_utc(),
        notes: winner.notes,
    }
}

pub fn winner_model_to_masked_info(winner: winner::Model) -> WinnerInfo {
    let mut info = winner_model_to_info(winner);
    info.cpf = mask_cpf(&info.cpf);
    info
}
