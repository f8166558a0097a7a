use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::models::ServerRow;
use crate::db::queries::servers;
use crate::minecraft::address::{ServerAddress, display_label, format_address};

use super::events::ConversationId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
}

/// The persisted server registration of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    pub id: i64,
    pub conversation_id: ConversationId,
    pub address: ServerAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServerRecord {
    pub fn host(&self) -> &str {
        &self.address.host
    }

    pub fn port(&self) -> u16 {
        self.address.port
    }

    /// `host` or `host:port`.
    pub fn formatted_address(&self) -> String {
        format_address(&self.address.host, self.address.port)
    }

    /// Display name, falling back to the formatted address.
    pub fn label(&self) -> String {
        display_label(
            &self.address.display_name,
            &self.address.host,
            self.address.port,
        )
    }
}

impl TryFrom<ServerRow> for ServerRecord {
    type Error = StoreError;

    fn try_from(row: ServerRow) -> Result<Self, Self::Error> {
        let port = u16::try_from(row.port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| StoreError::InvalidRecord(format!("port {}", row.port)))?;
        Ok(Self {
            id: row.id,
            conversation_id: row.conversation_id,
            address: ServerAddress {
                host: row.host,
                port,
                display_name: row.name,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Per-conversation server registrations.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, conversation_id: ConversationId)
    -> Result<Option<ServerRecord>, StoreError>;

    /// Create the record, or overwrite the address of the existing one.
    async fn upsert(
        &self,
        conversation_id: ConversationId,
        address: &ServerAddress,
    ) -> Result<ServerRecord, StoreError>;

    /// Returns whether a record existed.
    async fn delete(&self, conversation_id: ConversationId) -> Result<bool, StoreError>;
}

/// `ConfigStore` over the `servers` table.
#[derive(Clone)]
pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ServerRecord>, StoreError> {
        servers::get_by_conversation(&self.pool, conversation_id)
            .await?
            .map(ServerRecord::try_from)
            .transpose()
    }

    async fn upsert(
        &self,
        conversation_id: ConversationId,
        address: &ServerAddress,
    ) -> Result<ServerRecord, StoreError> {
        let row = servers::upsert(
            &self.pool,
            conversation_id,
            &address.host,
            address.port,
            &address.display_name,
        )
        .await?;
        ServerRecord::try_from(row)
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<bool, StoreError> {
        Ok(servers::delete(&self.pool, conversation_id).await?)
    }
}
