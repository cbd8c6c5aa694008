use gemline_entities::{memory_logs, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::info;

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("already exists")
}

/// Database-backed mode and memory store.
///
/// Implements both [`gemline_core::ModeStore`] and
/// [`gemline_core::MemoryStore`] over one connection pool.
pub struct MemoryManager {
    pub(crate) db: DatabaseConnection,
}

impl MemoryManager {
    /// Connect to `database_url` and create missing tables.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        Self::connect_with(ConnectOptions::new(database_url.to_owned())).await
    }

    pub async fn connect_with(options: ConnectOptions) -> anyhow::Result<Self> {
        info!("Connecting to database for MemoryManager");
        let db = Database::connect(options).await?;
        let manager = Self { db };
        manager.create_tables().await?;
        info!("MemoryManager initialized");
        Ok(manager)
    }

    async fn create_tables(&self) -> anyhow::Result<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let statements = [
            schema.create_table_from_entity(users::Entity),
            schema.create_table_from_entity(memory_logs::Entity),
        ];

        for stmt in &statements {
            match self
                .db
                .execute_unprepared(&backend.build(stmt).to_string())
                .await
            {
                Ok(_) => {}
                Err(e) if is_table_already_exists_error(&e) => {
                    info!("Table already exists, skipping creation");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// List scopes that currently hold a memory log.
    pub async fn list_scopes(&self) -> anyhow::Result<Vec<String>> {
        let logs = memory_logs::Entity::find().all(&self.db).await?;
        Ok(logs.into_iter().map(|m| m.scope).collect())
    }
}
