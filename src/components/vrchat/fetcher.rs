use super::models::{EventDetail, EventRecord, GroupRecord, RawCalendarEvent, RawGroup};
use crate::error::RelayResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read access to group calendars and group metadata
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Full calendar listing of a group
    async fn list_events(&self, group_id: &str) -> RelayResult<Vec<RawCalendarEvent>>;

    /// Detail view of one calendar event
    async fn get_event(&self, group_id: &str, event_id: &str) -> RelayResult<RawCalendarEvent>;

    /// Group metadata
    async fn get_group(&self, group_id: &str) -> RelayResult<RawGroup>;
}

/// Turns raw calendar data into normalized records.
///
/// Failures stay inside: a broken listing yields no events for that group and
/// a broken detail lookup yields an event without platforms, image or tags.
#[derive(Clone)]
pub struct EventFetcher {
    source: Arc<dyn CalendarSource>,
}

impl EventFetcher {
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self { source }
    }

    /// Current events of a group, measured against the time of the call
    pub async fn fetch_group_events(&self, group_id: &str) -> Vec<EventRecord> {
        self.fetch_group_events_at(group_id, Utc::now()).await
    }

    /// Events of a group whose end is not before `now`
    pub async fn fetch_group_events_at(
        &self,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<EventRecord> {
        let listing = match self.source.list_events(group_id).await {
            Ok(listing) => listing,
            Err(e) => {
                error!("Failed to fetch events for {}: {}", group_id, e);
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for raw in listing {
            let record = EventRecord::from_listing(group_id, raw, EventDetail::default());
            if !record.ends_at.is_not_before(now) {
                continue;
            }

            let detail = match self.source.get_event(group_id, &record.event_id).await {
                Ok(full) => EventDetail::from(full),
                Err(e) => {
                    warn!(
                        "Failed to fetch details for {} from {}: {}",
                        record.event_id, group_id, e
                    );
                    EventDetail::default()
                }
            };

            events.push(EventRecord {
                platforms: detail.platforms,
                image_url: detail.image_url,
                tags: detail.tags,
                ..record
            });
        }

        info!("Found {} events for {}.", events.len(), group_id);
        events
    }

    /// Name and description of a group, or `None` when it has no usable name
    pub async fn fetch_group_info(&self, group_id: &str) -> Option<GroupRecord> {
        let group = match self.source.get_group(group_id).await {
            Ok(group) => group,
            Err(e) => {
                error!("Failed to fetch info for {}: {}", group_id, e);
                return None;
            }
        };

        let name = match group.name.filter(|name| !name.trim().is_empty()) {
            Some(name) => name,
            None => {
                info!("No name found for {}.", group_id);
                return None;
            }
        };

        info!("Found group '{}' (ID: {})", name, group_id);
        Some(GroupRecord {
            group_id: group_id.to_string(),
            name,
            description: group.description.unwrap_or_default(),
        })
    }
}
