use super::handle::RelayHandle;
use crate::config::Config;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Run a poll cycle, then wait out the poll period, until cancelled.
///
/// The period is re-read after every cycle so a reload takes effect on the
/// next wait.
pub async fn run_poll_loop(
    handle: RelayHandle,
    config: Arc<RwLock<Config>>,
    cancel: CancellationToken,
) {
    info!("Poll loop started");

    loop {
        match handle.refetch().await {
            Ok(report) => debug!("Poll cycle finished: {:?}", report),
            Err(e) => error!("Poll cycle failed, retrying next period: {}", e),
        }

        let period = config.read().await.poll_interval();
        info!("Next poll in {}s", period.as_secs());

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(period) => {}
        }
    }

    info!("Poll loop stopped");
}
