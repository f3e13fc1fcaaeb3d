use entities::{payment, purchase, purchase_number, raffle, winner};
use sea_orm_migration::{prelude::*, sea_orm::Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db_backend = manager.get_database_backend();
        let schema = Schema::new(db_backend);

        // ----- Tables (via entities), parents first -----
        manager
            .create_table(
                schema
                    .create_table_from_entity(raffle::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        for mut idx in schema.create_index_from_entity(raffle::Entity) {
            manager.create_index(idx.if_not_exists().to_owned()).await?;
        }

        manager
            .create_table(
                schema
                    .create_table_from_entity(purchase::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        for mut idx in schema.create_index_from_entity(purchase::Entity) {
            manager.create_index(idx.if_not_exists().to_owned()).await?;
        }

        manager
            .create_table(
                schema
                    .create_table_from_entity(purchase_number::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        for mut idx in schema.create_index_from_entity(purchase_number::Entity) {
            manager.create_index(idx.if_not_exists().to_owned()).await?;
        }

        manager
            .create_table(
                schema
                    .create_table_from_entity(payment::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        for mut idx in schema.create_index_from_entity(payment::Entity) {
            manager.create_index(idx.if_not_exists().to_owned()).await?;
        }

        manager
            .create_table(
                schema
                    .create_table_from_entity(winner::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        for mut idx in schema.create_index_from_entity(winner::Entity) {
            manager.create_index(idx.if_not_exists().to_owned()).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ----- Drop tables in reverse order -----
        manager
            .drop_table(Table::drop().table(winner::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(payment::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(purchase_number::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(purchase::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(raffle::Entity).to_owned())
            .await?;
        Ok(())
    }
}
