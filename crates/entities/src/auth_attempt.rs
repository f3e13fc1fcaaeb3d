//! `SeaORM` Entity definition for failed admin login counters.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "AuthAttempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub ip_address: String,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub raffle_id: String,
    pub attempt_count: i32,
    pub last_attempt: DateTime,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
