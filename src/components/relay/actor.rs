use super::ledger::Ledger;
use crate::components::vrchat::{EventFetcher, EventRecord};
use crate::components::website::Forwarder;
use crate::config::Config;
use crate::error::{component_error, RelayResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Counts from one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub groups: usize,
    pub fetched: usize,
    pub new_events: usize,
    pub accepted: usize,
    pub appended: usize,
}

/// The relay actor that owns the ledger and runs poll cycles
pub struct RelayActor {
    config: Arc<RwLock<Config>>,
    ledger: Ledger,
    fetcher: EventFetcher,
    forwarder: Arc<Forwarder>,
    command_rx: mpsc::Receiver<RelayCommand>,
}

/// Commands that can be sent to the relay actor
pub enum RelayCommand {
    RunCycle(mpsc::Sender<RelayResult<CycleReport>>),
    Shutdown,
}

/// Handle for communicating with the relay actor
#[derive(Clone)]
pub struct RelayActorHandle {
    command_tx: mpsc::Sender<RelayCommand>,
}

impl RelayActorHandle {
    /// Queue a poll cycle and wait for its report
    pub async fn run_cycle(&self) -> RelayResult<CycleReport> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(RelayCommand::RunCycle(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> RelayResult<()> {
        let _ = self.command_tx.send(RelayCommand::Shutdown).await;
        Ok(())
    }
}

impl RelayActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        ledger: Ledger,
        fetcher: EventFetcher,
        forwarder: Arc<Forwarder>,
    ) -> (Self, RelayActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            ledger,
            fetcher,
            forwarder,
            command_rx,
        };

        (actor, RelayActorHandle { command_tx })
    }

    /// Start the actor's processing loop.
    ///
    /// Commands are handled one at a time, so a console refetch and a
    /// scheduled cycle never interleave their ledger reads and appends.
    pub async fn run(&mut self) {
        info!("Relay actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RelayCommand::RunCycle(response_tx) => {
                    let result = self.run_cycle().await;
                    if let Err(e) = &result {
                        error!("Poll cycle aborted: {}", e);
                    }
                    let _ = response_tx.send(result).await;
                }
                RelayCommand::Shutdown => {
                    info!("Relay actor shutting down");
                    break;
                }
            }
        }

        info!("Relay actor shut down");
    }

    /// load -> fetch every group -> diff -> forward -> append
    async fn run_cycle(&self) -> RelayResult<CycleReport> {
        let known = self.ledger.load().await?;

        let (group_ids, delay) = {
            let config_read = self.config.read().await;
            (config_read.group_ids.clone(), config_read.group_fetch_delay())
        };
        if group_ids.is_empty() {
            warn!("No group ids configured, nothing to fetch");
        }

        let mut fetched = Vec::new();
        for group_id in &group_ids {
            info!("Fetching events for group {}...", group_id);
            fetched.extend(self.fetcher.fetch_group_events(group_id).await);
            sleep(delay).await;
        }

        let mut report = CycleReport {
            groups: group_ids.len(),
            fetched: fetched.len(),
            ..Default::default()
        };

        let fresh = select_new_events(fetched, &known);
        report.new_events = fresh.len();

        if fresh.is_empty() {
            info!("No new events found");
            return Ok(report);
        }

        info!("Found {} new events.", fresh.len());
        let outcome = self.forwarder.send_batch(&fresh).await;
        report.accepted = outcome.sent();

        // Only accepted events are recorded; the rest are retried next cycle
        self.ledger.append(&outcome.accepted).await?;
        report.appended = outcome.accepted.len();

        if report.appended < fresh.len() {
            warn!(
                "{} new events were not accepted and will be retried",
                fresh.len() - report.appended
            );
        }
        info!("Added {} new events.", report.appended);

        Ok(report)
    }
}

/// Events whose token is absent from `known`, first occurrence only, in input order
pub fn select_new_events(events: Vec<EventRecord>, known: &HashSet<String>) -> Vec<EventRecord> {
    let mut seen = HashSet::new();

    events
        .into_iter()
        .filter(|event| {
            let key = event.dedup_key();
            !known.contains(&key) && seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::vrchat::time::Timestamp;

    fn event(event_id: &str, group_id: &str) -> EventRecord {
        EventRecord {
            group_id: group_id.to_string(),
            event_id: event_id.to_string(),
            title: String::new(),
            description: String::new(),
            starts_at: Timestamp::parse("2025-01-01T00:00:00Z"),
            ends_at: Timestamp::parse("2025-01-01T01:00:00Z"),
            category: String::new(),
            access_type: String::new(),
            platforms: Vec::new(),
            image_url: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_select_new_events_skips_known() {
        let known: HashSet<String> = ["e1 from g1".to_string()].into_iter().collect();
        let fresh = select_new_events(vec![event("e1", "g1"), event("e2", "g1")], &known);

        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].event_id, "e2");
    }

    #[test]
    fn test_select_new_events_collapses_same_cycle_duplicates() {
        let fresh = select_new_events(
            vec![
                event("e1", "g1"),
                event("e2", "g1"),
                event("e1", "g1"),
                event("e1", "g2"),
            ],
            &HashSet::new(),
        );

        let keys: Vec<String> = fresh.iter().map(EventRecord::dedup_key).collect();
        assert_eq!(keys, vec!["e1 from g1", "e2 from g1", "e1 from g2"]);
    }
}
