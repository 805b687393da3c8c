mod actor;
mod handle;
pub mod ledger;
mod scheduler;

pub use actor::{select_new_events, CycleReport};
pub use handle::RelayHandle;
pub use ledger::Ledger;

use super::{Component, Services};
use crate::error::RelayResult;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Scheduled polling of the configured group calendars
#[derive(Default)]
pub struct EventRelay {
    handle: RwLock<Option<RelayHandle>>,
    task: RwLock<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl EventRelay {
    /// Create a new event relay component
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Component for EventRelay {
    fn name(&self) -> &'static str {
        "event_relay"
    }

    async fn init(&self, services: &Services) -> RelayResult<()> {
        *self.handle.write().await = Some(services.relay.clone());

        let mut task = self.task.write().await;
        if task.is_none() {
            *task = Some(tokio::spawn(scheduler::run_poll_loop(
                services.relay.clone(),
                services.config.clone(),
                self.cancel.child_token(),
            )));
        }

        Ok(())
    }

    async fn shutdown(&self) -> RelayResult<()> {
        self.cancel.cancel();

        // A cycle in flight finishes inside the actor on its own
        if let Some(task) = self.task.write().await.take() {
            task.abort();
        }

        if let Some(handle) = self.handle.read().await.as_ref() {
            handle.shutdown().await?;
        }

        Ok(())
    }
}
