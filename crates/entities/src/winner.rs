//! `SeaORM` Entity definition for drawn winners.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "Winner")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", indexed)]
    pub raffle_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub purchase_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub winner_name: String,
    #[sea_orm(column_type = "Text")]
    pub winner_cpf: String,
    pub winning_number: i32,
    pub drawn_at: DateTime,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Purchase,
}

impl Related<super::raffle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Raffle.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
