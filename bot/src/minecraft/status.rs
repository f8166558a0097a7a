use serde::{Deserialize, Serialize};

/// A player entry from the server's status sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub uuid: String,
}

/// Status as reported by a reachable server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStatus {
    pub version: String,
    pub protocol: i32,
    pub description: String,
    pub players_online: i64,
    pub players_max: i64,
    pub sample: Vec<Player>,
}

/// Outcome of one probe. All fields other than `online` are empty when offline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub online: bool,
    pub version: String,
    pub protocol: i32,
    pub description: String,
    pub players_online: i64,
    pub players_max: i64,
    pub sample: Vec<Player>,
}

impl ProbeResult {
    pub fn offline() -> Self {
        Self::default()
    }
}

impl From<ServerStatus> for ProbeResult {
    fn from(status: ServerStatus) -> Self {
        Self {
            online: true,
            version: status.version,
            protocol: status.protocol,
            description: status.description,
            players_online: status.players_online,
            players_max: status.players_max,
            sample: status.sample,
        }
    }
}
