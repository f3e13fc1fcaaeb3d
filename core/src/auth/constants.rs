pub const ADMIN_COOKIE_PREFIX: &str = "admin_auth_";
pub const FALLBACK_CLIENT_IP: &str = "127.0.0.1";
pub const MIN_ADMIN_PASSWORD_LEN: usize = 6;

pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";
pub const HEADER_REAL_IP: &str = "x-real-ip";
