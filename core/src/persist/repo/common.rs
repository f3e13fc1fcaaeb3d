use chrono::NaiveDateTime;
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

pub fn now() -> NaiveDateTime {
    crate::util::now_naive()
}

pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

pub fn is_uuid(raw: &str) -> bool {
    Uuid::parse_str(raw.trim()).is_ok()
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
