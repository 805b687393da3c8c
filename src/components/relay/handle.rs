use super::actor::{CycleReport, RelayActor, RelayActorHandle};
use super::ledger::Ledger;
use crate::components::vrchat::EventFetcher;
use crate::components::website::Forwarder;
use crate::config::Config;
use crate::error::RelayResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the relay actor
#[derive(Clone)]
pub struct RelayHandle {
    actor_handle: RelayActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl RelayHandle {
    /// Create a new RelayHandle and spawn the actor
    pub fn new(
        config: Arc<RwLock<Config>>,
        ledger: Ledger,
        fetcher: EventFetcher,
        forwarder: Arc<Forwarder>,
    ) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = RelayActor::new(config, ledger, fetcher, forwarder);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Run one full poll cycle, waiting behind any cycle already in progress
    pub async fn refetch(&self) -> RelayResult<CycleReport> {
        self.actor_handle.run_cycle().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> RelayResult<()> {
        self.actor_handle.shutdown().await
    }
}
