use super::CommandResult;
use crate::components::vrchat::EventRecord;
use crate::components::Services;
use tracing::info;

/// Run a poll cycle now, queued behind any cycle already running
pub async fn refetch(services: &Services) -> CommandResult {
    let report = services.relay.refetch().await?;
    info!(
        "Refetch done: {} groups, {} events fetched, {} new, {} accepted",
        report.groups, report.fetched, report.new_events, report.accepted
    );
    Ok(())
}

/// Create an event on the website by hand
pub async fn add_event(services: &Services, event: &EventRecord) -> CommandResult {
    services.forwarder.create_event(event).await;
    Ok(())
}

/// Overwrite an event already stored on the website
pub async fn update_event(
    services: &Services,
    website_id: &str,
    event: &EventRecord,
) -> CommandResult {
    services.forwarder.update_event(website_id, event).await;
    Ok(())
}

pub async fn delete_event(services: &Services, website_id: &str) -> CommandResult {
    services.forwarder.delete_event(website_id).await;
    Ok(())
}
