use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ConnectOptions, Database, DatabaseBackend, DatabaseConnection, EntityTrait,
    Schema,
};
use tracing::debug;

use crate::entities;
use crate::storage::{EventStore, PointdataRecord, StorageResult};

/// sea-orm backed store. The connection is a pool shared by every request.
#[derive(Clone)]
pub struct SeaOrmEventStore {
    db: DatabaseConnection,
}

impl SeaOrmEventStore {
    pub async fn connect(dsn: &str) -> StorageResult<Self> {
        let mut options = ConnectOptions::new(dsn.to_owned());
        options.sqlx_logging(false);
        if is_sqlite_memory(dsn) {
            // Every pooled connection would otherwise see its own empty database.
            options.max_connections(1).min_connections(1);
        }
        let db = Database::connect(options).await?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.db.get_database_backend()
    }

    /// Entity-first schema sync. Creates the `pointdata` table when missing.
    pub async fn sync(&self) -> StorageResult<()> {
        Schema::new(self.db.get_database_backend())
            .builder()
            .register(entities::Pointdata)
            .sync(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for SeaOrmEventStore {
    async fn insert_event(&self, record: &PointdataRecord) -> StorageResult<()> {
        let active: entities::pointdata::ActiveModel = record.clone().into();
        let result = entities::Pointdata::insert(active).exec(&self.db).await?;
        debug!(event = "pointdata_inserted", id = result.last_insert_id);
        Ok(())
    }
}

#[allow(clippy::needless_update)]
impl From<PointdataRecord> for entities::pointdata::ActiveModel {
    fn from(record: PointdataRecord) -> Self {
        entities::pointdata::ActiveModel {
            id: ActiveValue::NotSet,
            timestamp: ActiveValue::Set(record.timestamp),
            received_at: ActiveValue::Set(record.received_at),
            system: ActiveValue::Set(record.system),
            username: ActiveValue::Set(record.username),
            remote_ip: ActiveValue::Set(record.remote_ip),
            server_ip: ActiveValue::Set(record.server_ip),
            data: ActiveValue::Set(record.data),
            tzinfo: ActiveValue::Set(record.tzinfo),
            is_utc: ActiveValue::Set(record.is_utc),
            ..Default::default()
        }
    }
}

fn is_sqlite_memory(dsn: &str) -> bool {
    let Some(rest) = dsn.strip_prefix("sqlite:") else {
        return false;
    };
    let rest = rest.trim_start_matches("//");
    rest.starts_with(":memory:") || rest.contains("mode=memory")
}
