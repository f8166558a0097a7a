use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::minecraft::address::ServerAddress;
use crate::minecraft::probe::{ProbeError, StatusProbe};
use crate::minecraft::status::ProbeResult;

use super::error::BotError;
use super::events::ConversationId;
use super::store::{ConfigStore, ServerRecord};

/// Everything the status screens need to render.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusResult {
    /// No server registered; the probe was not attempted.
    NotConfigured,
    /// The probe ran to completion, online or not.
    Probed {
        record: ServerRecord,
        probe: ProbeResult,
    },
    /// The probe was abandoned (shutdown). Rendered like an offline server.
    Failed {
        record: ServerRecord,
        error: ProbeError,
    },
}

impl StatusResult {
    pub fn record(&self) -> Option<&ServerRecord> {
        match self {
            StatusResult::NotConfigured => None,
            StatusResult::Probed { record, .. } | StatusResult::Failed { record, .. } => {
                Some(record)
            }
        }
    }

    /// The probe outcome, only when the server answered.
    pub fn online_probe(&self) -> Option<&ProbeResult> {
        match self {
            StatusResult::Probed { probe, .. } if probe.online => Some(probe),
            _ => None,
        }
    }
}

/// Joins config lookup and probing for one conversation.
pub struct StatusService {
    store: Arc<dyn ConfigStore>,
    probe: StatusProbe,
}

impl StatusService {
    pub fn new(store: Arc<dyn ConfigStore>, probe: StatusProbe) -> Self {
        Self { store, probe }
    }

    pub async fn get_config(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ServerRecord>, BotError> {
        debug!(conversation_id, "getting server config");
        Ok(self.store.get(conversation_id).await?)
    }

    pub async fn set_config(
        &self,
        conversation_id: ConversationId,
        address: &ServerAddress,
    ) -> Result<ServerRecord, BotError> {
        info!(
            conversation_id,
            host = %address.host,
            port = address.port,
            name = %address.display_name,
            "setting server config"
        );
        Ok(self.store.upsert(conversation_id, address).await?)
    }

    pub async fn get_status(
        &self,
        cancel: &CancellationToken,
        conversation_id: ConversationId,
    ) -> Result<StatusResult, BotError> {
        let Some(record) = self.store.get(conversation_id).await? else {
            debug!(conversation_id, "no server configured");
            return Ok(StatusResult::NotConfigured);
        };

        match self.probe.probe(cancel, record.host(), record.port()).await {
            Ok(probe) => {
                info!(
                    conversation_id,
                    host = %record.host(),
                    port = record.port(),
                    online = probe.online,
                    players = probe.players_online,
                    "server status retrieved"
                );
                Ok(StatusResult::Probed { record, probe })
            }
            Err(error) => {
                warn!(conversation_id, host = %record.host(), %error, "status check abandoned");
                Ok(StatusResult::Failed { record, error })
            }
        }
    }
}
