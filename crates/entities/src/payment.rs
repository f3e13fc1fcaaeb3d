//! `SeaORM` Entity definition for processor payments.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "Payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", indexed)]
    pub raffle_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub purchase_id: Option<String>,
    #[sea_orm(column_type = "Text", unique)]
    pub payment_intent_id: String,
    /// Whole currency units; the processor is billed in cents.
    pub amount: i64,
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    #[sea_orm(column_type = "Text")]
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub payment_method: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub customer_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub customer_email: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
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
