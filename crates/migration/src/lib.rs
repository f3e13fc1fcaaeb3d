pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_raffle_tables;
mod m20250301_000002_winner_unique_number;
mod m20250301_000003_auth_attempts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_raffle_tables::Migration),
            Box::new(m20250301_000002_winner_unique_number::Migration),
            Box::new(m20250301_000003_auth_attempts::Migration),
        ]
    }
}
