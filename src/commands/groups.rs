use super::CommandResult;
use crate::components::Services;
use tracing::warn;

/// Look the group up on VRChat and create it on the website
pub async fn add_group(services: &Services, group_id: &str) -> CommandResult {
    match services.fetcher.fetch_group_info(group_id).await {
        Some(group) => {
            services.forwarder.create_group(&group).await;
        }
        None => warn!("Failed to get group info for {}", group_id),
    }
    Ok(())
}

/// Refresh the website's copy of a group from VRChat
pub async fn update_group(services: &Services, group_id: &str) -> CommandResult {
    match services.fetcher.fetch_group_info(group_id).await {
        Some(group) => {
            services.forwarder.update_group(&group).await;
        }
        None => warn!("Failed to get group info for {}", group_id),
    }
    Ok(())
}

pub async fn delete_group(services: &Services, group_id: &str) -> CommandResult {
    services.forwarder.delete_group(group_id).await;
    Ok(())
}
