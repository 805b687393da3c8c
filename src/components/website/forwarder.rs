use super::models::{EventPayload, GroupPayload};
use super::transport::{HttpMethod, OutboundRequest, Transport};
use crate::components::vrchat::{EventRecord, GroupRecord};
use crate::config::Config;
use crate::error::{config_error, RelayResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::Url;

/// Which website collection a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Events,
    Groups,
}

/// Where and how to reach the website, when forwarding is configured
#[derive(Debug, Clone)]
struct Destination {
    base: Url,
    api_key: String,
    contact: String,
}

impl Destination {
    /// `Ok(None)` when the endpoint or the API key is unset
    fn resolve(config: &Config, resource: Resource) -> RelayResult<Option<Self>> {
        let endpoint = match resource {
            Resource::Events => config.event_endpoint.as_ref(),
            Resource::Groups => config.group_endpoint.as_ref(),
        };
        let (Some(endpoint), Some(api_key)) = (endpoint, config.api_key.as_ref()) else {
            return Ok(None);
        };

        let base = Url::parse(endpoint)?;
        if base.cannot_be_a_base() {
            return Err(config_error(&format!(
                "Website endpoint cannot take path segments: {}",
                endpoint
            )));
        }

        Ok(Some(Self {
            base,
            api_key: api_key.clone(),
            contact: config.contact.clone(),
        }))
    }

    /// Endpoint with each item appended as one escaped path segment
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        // Checked in `resolve`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }
}

/// Result of one website call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// 200 or 201
    Accepted,
    /// Any other status
    Rejected(u16),
    /// No response at all
    Failed(String),
    /// Forwarding not configured
    Skipped,
}

impl Delivery {
    /// Accepted, or skipped because forwarding is off
    pub fn is_success(&self) -> bool {
        matches!(self, Delivery::Accepted | Delivery::Skipped)
    }
}

/// Result of forwarding a batch of events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Calls made
    pub attempted: usize,
    /// Ledger tokens of events the website took (all of them when skipped)
    pub accepted: Vec<String>,
    /// Forwarding was not configured
    pub skipped: bool,
}

impl BatchOutcome {
    /// Number of events accepted downstream
    pub fn sent(&self) -> usize {
        self.accepted.len()
    }
}

/// Sends event and group records to the website API.
///
/// Nothing here returns an error: every failure is logged against the item it
/// belongs to and reported as a `Delivery`.
pub struct Forwarder {
    config: Arc<RwLock<Config>>,
    transport: Arc<dyn Transport>,
}

impl Forwarder {
    pub fn new(config: Arc<RwLock<Config>>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// The destination for `resource`, or the `Delivery` to report instead
    async fn destination(
        &self,
        resource: Resource,
        action: &str,
    ) -> Result<Destination, Delivery> {
        let resolved = {
            let config = self.config.read().await;
            Destination::resolve(&config, resource)
        };

        match resolved {
            Ok(Some(destination)) => Ok(destination),
            Ok(None) => {
                info!("Skipping {} (no endpoint/API key).", action);
                Err(Delivery::Skipped)
            }
            Err(e) => {
                error!("Cannot run {}: {}", action, e);
                Err(Delivery::Failed(e.to_string()))
            }
        }
    }

    async fn dispatch<T: Serialize>(
        &self,
        destination: &Destination,
        method: HttpMethod,
        url: String,
        body: Option<&T>,
        label: &str,
    ) -> Delivery {
        let body = match body.map(serde_json::to_value).transpose() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize {}: {}", label, e);
                return Delivery::Failed(e.to_string());
            }
        };

        let request = OutboundRequest {
            method,
            url,
            api_key: destination.api_key.clone(),
            contact: destination.contact.clone(),
            body,
        };

        match self.transport.send(request).await {
            Ok(response) if response.is_accepted() => {
                info!("{} succeeded.\n[Website Response] {}", label, response.display_body());
                Delivery::Accepted
            }
            Ok(response) => {
                warn!(
                    "{} failed ({}): {}",
                    label,
                    response.status,
                    response.display_body()
                );
                Delivery::Rejected(response.status)
            }
            Err(e) => {
                error!("Error during {}: {}", label, e);
                Delivery::Failed(e.to_string())
            }
        }
    }

    /// Forward new events one at a time, pacing the calls.
    ///
    /// A failing item never stops the rest of the batch.
    pub async fn send_batch(&self, events: &[EventRecord]) -> BatchOutcome {
        let destination = match self.destination(Resource::Events, "website sending").await {
            Ok(destination) => destination,
            Err(Delivery::Skipped) => {
                return BatchOutcome {
                    attempted: 0,
                    accepted: events.iter().map(EventRecord::dedup_key).collect(),
                    skipped: true,
                };
            }
            // Nothing is accepted, so every event is retried next cycle
            Err(_) => return BatchOutcome::default(),
        };
        let pacing = self.config.read().await.forward_pacing();

        let mut outcome = BatchOutcome::default();
        for (index, event) in events.iter().enumerate() {
            if index > 0 {
                sleep(pacing).await;
            }

            let key = event.dedup_key();
            info!("Sending event: {}", key);

            let payload = EventPayload::from(event);
            let delivery = self
                .dispatch(
                    &destination,
                    HttpMethod::Post,
                    destination.url(&[]),
                    Some(&payload),
                    &format!("Sending event {}", key),
                )
                .await;

            outcome.attempted += 1;
            if delivery == Delivery::Accepted {
                outcome.accepted.push(key);
            }
        }

        info!(
            "Finished sending {}/{} events.",
            outcome.sent(),
            events.len()
        );
        outcome
    }

    /// Create one event on the website
    pub async fn create_event(&self, event: &EventRecord) -> Delivery {
        let destination = match self.destination(Resource::Events, "event creation").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        info!("Creating event '{}' ({})...", event.title, event.event_id);
        let payload = EventPayload::from(event);
        self.dispatch(
            &destination,
            HttpMethod::Post,
            destination.url(&[]),
            Some(&payload),
            &format!("Creating event '{}'", event.title),
        )
        .await
    }

    /// Replace an event stored on the website under `website_id`
    pub async fn update_event(&self, website_id: &str, event: &EventRecord) -> Delivery {
        let destination = match self.destination(Resource::Events, "event update").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        let url = destination.url(&[website_id, "update"]);
        info!("Updating event '{}' ({}) at {}...", event.title, event.event_id, url);
        let payload = EventPayload::from(event);
        self.dispatch(
            &destination,
            HttpMethod::Post,
            url,
            Some(&payload),
            &format!("Updating event '{}'", event.title),
        )
        .await
    }

    /// Remove an event stored on the website under `website_id`
    pub async fn delete_event(&self, website_id: &str) -> Delivery {
        let destination = match self.destination(Resource::Events, "event deletion").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        info!("Deleting event id {}", website_id);
        self.dispatch::<()>(
            &destination,
            HttpMethod::Post,
            destination.url(&[website_id, "delete"]),
            None,
            &format!("Deleting event '{}'", website_id),
        )
        .await
    }

    /// Create a group on the website
    pub async fn create_group(&self, group: &GroupRecord) -> Delivery {
        let destination = match self.destination(Resource::Groups, "group creation").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        info!("Creating group '{}' ({})...", group.name, group.group_id);
        let payload = GroupPayload::from(group);
        self.dispatch(
            &destination,
            HttpMethod::Post,
            destination.url(&[]),
            Some(&payload),
            &format!("Creating group '{}'", group.name),
        )
        .await
    }

    /// Update a group on the website
    pub async fn update_group(&self, group: &GroupRecord) -> Delivery {
        let destination = match self.destination(Resource::Groups, "group update").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        info!("Updating group '{}' ({})...", group.name, group.group_id);
        let payload = GroupPayload::from(group);
        self.dispatch(
            &destination,
            HttpMethod::Put,
            destination.url(&[group.group_id.as_str()]),
            Some(&payload),
            &format!("Updating group '{}'", group.name),
        )
        .await
    }

    /// Delete a group from the website
    pub async fn delete_group(&self, group_id: &str) -> Delivery {
        let destination = match self.destination(Resource::Groups, "group deletion").await {
            Ok(destination) => destination,
            Err(delivery) => return delivery,
        };

        info!("Deleting group {}...", group_id);
        self.dispatch::<()>(
            &destination,
            HttpMethod::Delete,
            destination.url(&[group_id]),
            None,
            &format!("Deleting group '{}'", group_id),
        )
        .await
    }
}
