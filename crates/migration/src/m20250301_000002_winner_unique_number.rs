use sea_orm::entity::prelude::DeriveIden;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const IDX_WINNER_RAFFLE_NUMBER: &str = "uniq_winner_raffle_number";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A number can be drawn at most once per raffle, even when two draws race.
        manager
            .create_index(
                Index::create()
                    .name(IDX_WINNER_RAFFLE_NUMBER)
                    .table(Winner::Table)
                    .col(Winner::RaffleId)
                    .col(Winner::WinningNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_WINNER_RAFFLE_NUMBER)
                    .table(Winner::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Winner {
    #[sea_orm(iden = "Winner")]
    Table,
    RaffleId,
    WinningNumber,
}
