use sea_orm::entity::prelude::DeriveIden;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthAttempt::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuthAttempt::IpAddress).text().not_null())
                    .col(ColumnDef::new(AuthAttempt::RaffleId).text().not_null())
                    .col(
                        ColumnDef::new(AuthAttempt::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AuthAttempt::LastAttempt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthAttempt::CreatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(AuthAttempt::IpAddress)
                            .col(AuthAttempt::RaffleId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_attempt_raffle")
                            .from(AuthAttempt::Table, AuthAttempt::RaffleId)
                            .to(Raffle::Table, Raffle::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_auth_attempt_last_attempt")
                    .table(AuthAttempt::Table)
                    .col(AuthAttempt::LastAttempt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_auth_attempt_last_attempt")
                    .table(AuthAttempt::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(AuthAttempt::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AuthAttempt {
    #[sea_orm(iden = "AuthAttempt")]
    Table,
    IpAddress,
    RaffleId,
    AttemptCount,
    LastAttempt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Raffle {
    #[sea_orm(iden = "Raffle")]
    Table,
    Id,
}
