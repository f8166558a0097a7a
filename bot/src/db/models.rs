use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat's registered Minecraft server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServerRow {
    pub id: i64,
    pub conversation_id: i64,
    pub host: String,
    pub port: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
