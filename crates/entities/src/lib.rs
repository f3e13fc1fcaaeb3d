pub mod prelude;

pub mod auth_attempt;
pub mod payment;
pub mod purchase;
pub mod purchase_number;
pub mod raffle;
pub mod winner;
