use crate::{
    error::{ServiceError, ServiceResult},
    model::{PurchaseInfo, PurchaseRequest},
    persist::{
        mapper,
        repo::{self, NewPurchase},
    },
    util::join_numbers,
};
use log::info;
use std::collections::BTreeSet;

use super::RaffleService;

const MAX_NAME_LEN: usize = 100;
const CPF_LEN: usize = 11;

/// Checks that do not need the raffle: buyer identity and the shape of the
/// number list.
pub fn validate_purchase_request(req: &PurchaseRequest) -> ServiceResult<()> {
    let name_len = req.name.trim().chars().count();
    if name_len == 0 {
        return Err(ServiceError::InvalidParams("Name is required".into()));
    }
    if name_len > MAX_NAME_LEN {
        return Err(ServiceError::InvalidParams("Name is too long".into()));
    }

    if req.cpf.len() != CPF_LEN {
        return Err(ServiceError::InvalidParams("CPF must be 11 digits".into()));
    }
    if !req.cpf.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidParams(
            "CPF must contain only digits".into(),
        ));
    }

    if req.numbers.is_empty() {
        return Err(ServiceError::InvalidParams(
            "At least one number is required".into(),
        ));
    }

    let mut seen = BTreeSet::new();
    let repeated: BTreeSet<i32> = req
        .numbers
        .iter()
        .filter(|n| !seen.insert(**n))
        .copied()
        .collect();
    if !repeated.is_empty() {
        let repeated: Vec<i32> = repeated.into_iter().collect();
        return Err(ServiceError::InvalidParams(format!(
            "Numbers {} are repeated",
            join_numbers(&repeated)
        )));
    }
    Ok(())
}

fn out_of_range(numbers: &[i32], total_numbers: i32) -> Vec<i32> {
    numbers
        .iter()
        .filter(|n| **n < 1 || **n > total_numbers)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl RaffleService {
    /// Claim `req.numbers` in a raffle for one buyer.
    pub async fn purchase_numbers(
        &self,
        raffle_key: &str,
        req: PurchaseRequest,
    ) -> ServiceResult<PurchaseInfo> {
        validate_purchase_request(&req)?;
        let raffle = self.load_raffle(raffle_key).await?;

        let invalid = out_of_range(&req.numbers, raffle.total_numbers);
        if !invalid.is_empty() {
            return Err(ServiceError::InvalidParams(format!(
                "Numbers {} are outside the valid range",
                join_numbers(&invalid)
            )));
        }

        let payment_id = req
            .payment_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty());

        let purchase = repo::create_purchase(
            &self.inner.persist_ctx,
            NewPurchase {
                raffle_id: raffle.id.clone(),
                name: req.name.trim().to_owned(),
                cpf: req.cpf,
                numbers: req.numbers,
                payment_id,
            },
        )
        .await?;

        info!(
            "purchase {} recorded for raffle {}: numbers {}",
            purchase.id, raffle.id, purchase.numbers
        );
        mapper::purchase_model_to_info(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(numbers: Vec<i32>) -> PurchaseRequest {
        PurchaseRequest {
            name: "Maria Silva".into(),
            cpf: "12345678901".into(),
            numbers,
            payment_id: None,
        }
    }

    #[test]
    fn well_formed_request_passes() {
        validate_purchase_request(&request(vec![1, 5, 9])).unwrap();
    }

    #[test]
    fn repeated_numbers_are_named() {
        let err = validate_purchase_request(&request(vec![4, 2, 4, 2, 1])).unwrap_err();
        match err {
            ServiceError::InvalidParams(msg) => assert_eq!(msg, "Numbers 2, 4 are repeated"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn identity_fields_are_checked() {
        let mut req = request(vec![1]);
        req.name = "   ".into();
        assert!(validate_purchase_request(&req).is_err());

        let mut req = request(vec![1]);
        req.name = "x".repeat(101);
        assert!(validate_purchase_request(&req).is_err());

        let mut req = request(vec![1]);
        req.cpf = "123.456.789-01".into();
        assert!(validate_purchase_request(&req).is_err());

        let mut req = request(vec![1]);
        req.cpf = "1234567890a".into();
        assert!(validate_purchase_request(&req).is_err());
    }

    #[test]
    fn empty_number_list_is_rejected() {
        assert!(validate_purchase_request(&request(vec![])).is_err());
    }

    #[test]
    fn range_check_lists_offenders_in_order() {
        assert_eq!(out_of_range(&[11, 0, 5, -3, 10], 10), vec![-3, 0, 11]);
        assert!(out_of_range(&[1, 10], 10).is_empty());
    }
}
