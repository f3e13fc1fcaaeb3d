use crate::config::DatabaseConfig;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

pub mod mapper;
pub mod repo;

#[derive(Clone)]
pub struct PersistCtx {
    pub db: Arc<DatabaseConnection>,
}

impl PersistCtx {
    /// Connect using the configured `DATABASE_URL`.
    pub async fn new(config: &DatabaseConfig) -> anyhow::Result<Self> {
        Self::connect(ConnectOptions::new(config.url.clone())).await
    }

    pub async fn connect(options: ConnectOptions) -> anyhow::Result<Self> {
        let db = Database::connect(options).await?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Inject an existing `DatabaseConnection`.
    pub fn from_conn(conn: DatabaseConnection) -> Self {
        Self { db: Arc::new(conn) }
    }

    /// Apply every pending schema migration.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        Migrator::up(self.db.as_ref(), None).await?;
        Ok(())
    }
}
