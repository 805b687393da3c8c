#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use vrc_event_relay::commands::input::OperatorInput;
use vrc_event_relay::components::relay::Ledger;
use vrc_event_relay::components::vrchat::models::{CurrentUser, RawCalendarEvent, RawGroup};
use vrc_event_relay::components::vrchat::{
    CalendarSource, ChallengeResponder, EventFetcher, SessionProvider,
};
use vrc_event_relay::components::website::{
    Forwarder, OutboundRequest, Transport, TransportResponse,
};
use vrc_event_relay::components::{RelayHandle, Services};
use vrc_event_relay::config::Config;
use vrc_event_relay::error::{other_error, upstream_error, RelayResult};

pub const EVENTS_URL: &str = "https://site.test/api/events";
pub const GROUPS_URL: &str = "https://site.test/api/groups";

/// Config pointing at the test website with no waits between calls
pub fn test_config(dir: &Path, groups: &[&str]) -> Config {
    Config {
        vrc_user: "user".to_string(),
        vrc_pass: "pass".to_string(),
        api_key: Some("secret".to_string()),
        event_endpoint: Some(EVENTS_URL.to_string()),
        group_endpoint: Some(format!("{}/", GROUPS_URL)),
        contact: "ops@example.com".to_string(),
        group_ids: groups.iter().map(|g| g.to_string()).collect(),
        events_file: dir.join("events.txt"),
        session_file: dir.join("session.json"),
        group_fetch_delay_ms: 0,
        forward_pacing_ms: 0,
        ..Default::default()
    }
}

/// Listing entry ending in the far future
pub fn raw_event(id: &str, title: &str) -> RawCalendarEvent {
    RawCalendarEvent {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        starts_at: "2099-01-01T20:00:00.000Z".to_string(),
        ends_at: "2099-01-01T22:00:00.000Z".to_string(),
        category: "hangout".to_string(),
        access_type: "public".to_string(),
        ..Default::default()
    }
}

/// Calendar source serving canned listings, details and groups
#[derive(Default)]
pub struct MockSource {
    listings: Mutex<HashMap<String, Vec<RawCalendarEvent>>>,
    details: Mutex<HashMap<String, RawCalendarEvent>>,
    groups: Mutex<HashMap<String, RawGroup>>,
    failing_listings: Mutex<HashSet<String>>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listing(&self, group_id: &str, events: Vec<RawCalendarEvent>) {
        self.listings
            .lock()
            .unwrap()
            .insert(group_id.to_string(), events);
    }

    pub fn set_detail(&self, event: RawCalendarEvent) {
        self.details.lock().unwrap().insert(event.id.clone(), event);
    }

    pub fn set_group(&self, id: &str, name: Option<&str>, description: Option<&str>) {
        self.groups.lock().unwrap().insert(
            id.to_string(),
            RawGroup {
                id: id.to_string(),
                name: name.map(str::to_string),
                description: description.map(str::to_string),
            },
        );
    }

    pub fn fail_listing(&self, group_id: &str) {
        self.failing_listings
            .lock()
            .unwrap()
            .insert(group_id.to_string());
    }
}

#[async_trait]
impl CalendarSource for MockSource {
    async fn list_events(&self, group_id: &str) -> RelayResult<Vec<RawCalendarEvent>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_listings.lock().unwrap().contains(group_id) {
            return Err(upstream_error("listing unavailable"));
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_event(&self, _group_id: &str, event_id: &str) -> RelayResult<RawCalendarEvent> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(event_id)
            .cloned()
            .ok_or_else(|| upstream_error("detail unavailable"))
    }

    async fn get_group(&self, group_id: &str) -> RelayResult<RawGroup> {
        self.groups
            .lock()
            .unwrap()
            .get(group_id)
            .cloned()
            .ok_or_else(|| upstream_error("group unavailable"))
    }
}

/// Transport that records every request and answers from a reply queue
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<OutboundRequest>>,
    replies: Mutex<VecDeque<Option<u16>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned in order; 201 once the queue runs out
    pub fn with_statuses(statuses: &[u16]) -> Self {
        let replies: Vec<Option<u16>> = statuses.iter().copied().map(Some).collect();
        Self::with_replies(&replies)
    }

    /// Like `with_statuses`, with `None` failing the call before any response
    pub fn with_replies(replies: &[Option<u16>]) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.iter().copied().collect()),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> RelayResult<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Some(201));
        match reply {
            Some(status) => Ok(TransportResponse {
                status,
                body: r#"{"ok":true}"#.to_string(),
            }),
            None => Err(other_error("connection reset")),
        }
    }
}

/// Session provider that always succeeds and counts logins
#[derive(Default)]
pub struct MockSession {
    pub logins: AtomicUsize,
}

#[async_trait]
impl SessionProvider for MockSession {
    async fn login(&self, _responder: Option<&dyn ChallengeResponder>) -> RelayResult<CurrentUser> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(CurrentUser {
            id: "usr_test".to_string(),
            display_name: "Tester".to_string(),
        })
    }
}

/// Everything a test needs to drive the relay end to end
pub struct Harness {
    pub config: Arc<RwLock<Config>>,
    pub source: Arc<MockSource>,
    pub transport: Arc<RecordingTransport>,
    pub services: Services,
}

impl Harness {
    pub fn new(
        config: Config,
        source: Arc<MockSource>,
        transport: Arc<RecordingTransport>,
    ) -> Self {
        let ledger = Ledger::new(config.events_file.clone());
        let config = Arc::new(RwLock::new(config));
        let fetcher = EventFetcher::new(source.clone());
        let forwarder = Arc::new(Forwarder::new(config.clone(), transport.clone()));
        let relay = RelayHandle::new(config.clone(), ledger, fetcher.clone(), forwarder.clone());

        let services = Services {
            config: config.clone(),
            fetcher,
            session: Arc::new(MockSession::default()),
            forwarder,
            relay,
            input: OperatorInput::from_reader(&b""[..]),
        };

        Self {
            config,
            source,
            transport,
            services,
        }
    }
}

/// Ledger lines in file order
pub fn ledger_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
