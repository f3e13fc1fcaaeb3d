//! `SeaORM` Entity definition for number purchases.

use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "Purchase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", indexed)]
    pub raffle_id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub cpf: String,
    /// JSON array of the purchased numbers, in the order the buyer sent them.
    #[sea_orm(column_type = "JsonBinary")]
    pub numbers: JsonValue,
    #[sea_orm(column_type = "Text", nullable)]
    pub payment_id: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::raffle::Entity",
        from = "Column::RaffleId",
        to = "super::raffle::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Raffle,
    #[sea_orm(has_many = "super::purchase_number::Entity")]
    PurchaseNumber,
}

impl Related<super::raffle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Raffle.def()
    }
}

impl Related<super::purchase_number::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseNumber.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
