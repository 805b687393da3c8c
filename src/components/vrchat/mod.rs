mod client;
pub mod fetcher;
mod keeper;
pub mod models;
pub mod session;
pub mod time;

pub use client::VrchatClient;
pub use fetcher::{CalendarSource, EventFetcher};
pub use models::{EventRecord, GroupRecord};
pub use session::{ChallengeResponder, SessionProvider};

use super::{Component, Services};
use crate::error::RelayResult;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Keeps the VRChat session alive in the background
#[derive(Default)]
pub struct SessionKeeper {
    task: RwLock<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl SessionKeeper {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Component for SessionKeeper {
    fn name(&self) -> &'static str {
        "session_keeper"
    }

    async fn init(&self, services: &Services) -> RelayResult<()> {
        let mut task = self.task.write().await;
        if task.is_none() {
            *task = Some(tokio::spawn(keeper::run_keeper(
                services.session.clone(),
                services.config.clone(),
                self.cancel.child_token(),
            )));
        }
        Ok(())
    }

    async fn shutdown(&self) -> RelayResult<()> {
        self.cancel.cancel();
        // A re-auth call in flight is dropped, not awaited
        if let Some(task) = self.task.write().await.take() {
            task.abort();
        }
        Ok(())
    }
}
