use super::session::SessionProvider;
use crate::config::Config;
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Re-authenticate on a fixed period until cancelled.
///
/// Never prompts: a two-factor challenge is logged and retried next period.
pub async fn run_keeper(
    session: Arc<dyn SessionProvider>,
    config: Arc<RwLock<Config>>,
    cancel: CancellationToken,
) {
    info!("Session keeper started");

    loop {
        let interval = config.read().await.reauth_interval();

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }

        match session.login(None).await {
            Ok(user) => debug!("Session still valid for {}", user.display_name),
            Err(Error::TwoFactorRequired(method)) => {
                error!(
                    "Re-authentication needs a {} code; run `login` in the console",
                    method
                );
            }
            Err(e) => error!("Reconnect failed: {}", e),
        }
    }

    info!("Session keeper stopped");
}
