pub use super::auth_attempt::Entity as AuthAttempt;
pub use super::payment::Entity as Payment;
pub use super::purchase::Entity as Purchase;
pub use super::purchase_number::Entity as PurchaseNumber;
pub use super::raffle::Entity as Raffle;
pub use super::winner::Entity as Winner;
