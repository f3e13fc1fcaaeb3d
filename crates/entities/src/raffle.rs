//! `SeaORM` Entity definition for raffles.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "Raffle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,
    pub total_numbers: i32,
    /// PHC-formatted password hash, never the password itself.
    #[sea_orm(column_type = "Text")]
    pub admin_password: String,
    #[sea_orm(column_type = "Text", nullable, unique)]
    pub friendly_id: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchase,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
    #[sea_orm(has_many = "super::winner::Entity")]
    Winner,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl Related<super::winner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Winner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
