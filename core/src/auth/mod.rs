pub mod client_ip;
pub mod constants;
pub mod password;
pub mod session;

pub use client_ip::client_ip;
pub use password::{hash_password, verify_password};
pub use session::{AdminSession, SessionSigner, admin_cookie_name};
