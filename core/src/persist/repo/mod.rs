pub mod auth_attempts;
pub mod common;
pub mod payments;
pub mod purchases;
pub mod raffles;
pub mod winners;

pub use auth_attempts::*;
pub use payments::*;
pub use purchases::*;
pub use raffles::*;
pub use winners::*;
