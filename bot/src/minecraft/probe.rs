use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::ping::PingCapability;
use super::status::ProbeResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The caller's token fired before the probe finished.
    #[error("status check cancelled")]
    Cancelled,
}

/// Runs one time-bounded ping and turns every outcome into a `ProbeResult`.
///
/// An unreachable server is a normal answer (`online: false`), not an error.
/// The only error is cancellation by the caller.
#[derive(Clone)]
pub struct StatusProbe {
    pinger: Arc<dyn PingCapability>,
    timeout: Duration,
}

impl StatusProbe {
    pub fn new(pinger: Arc<dyn PingCapability>, timeout: Duration) -> Self {
        Self { pinger, timeout }
    }

    pub async fn probe(
        &self,
        cancel: &CancellationToken,
        host: &str,
        port: u16,
    ) -> Result<ProbeResult, ProbeError> {
        debug!(%host, port, timeout = ?self.timeout, "starting status probe");

        let pinger = Arc::clone(&self.pinger);
        let task_host = host.to_string();
        let timeout = self.timeout;
        let mut task =
            tokio::spawn(async move { pinger.ping(&task_host, port, timeout).await });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                task.abort();
                warn!(%host, port, "status probe cancelled");
                Err(ProbeError::Cancelled)
            }
            joined = &mut task => match joined {
                Ok(Ok(status)) => {
                    debug!(
                        %host,
                        port,
                        version = %status.version,
                        players = status.players_online,
                        "status probe succeeded"
                    );
                    Ok(ProbeResult::from(status))
                }
                Ok(Err(e)) => {
                    warn!(%host, port, error = %e, "server unreachable");
                    Ok(ProbeResult::offline())
                }
                Err(e) => {
                    error!(%host, port, error = %e, "status probe task failed");
                    Ok(ProbeResult::offline())
                }
            },
            _ = tokio::time::sleep(timeout) => {
                task.abort();
                warn!(%host, port, "status probe timed out");
                Ok(ProbeResult::offline())
            }
        }
    }
}
