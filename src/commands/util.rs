use super::parser::{
    ADD_EVENT_USAGE, ADD_GROUP_USAGE, DELETE_EVENT_USAGE, DELETE_GROUP_USAGE, UPDATE_EVENT_USAGE,
    UPDATE_GROUP_USAGE,
};
use super::CommandResult;
use crate::components::Services;
use crate::config::{Config, ReloadTarget};
use tracing::info;

/// Print the command list
pub fn help() -> CommandResult {
    println!("Available commands:");
    for usage in [
        ADD_GROUP_USAGE,
        UPDATE_GROUP_USAGE,
        DELETE_GROUP_USAGE,
        ADD_EVENT_USAGE,
        UPDATE_EVENT_USAGE,
        DELETE_EVENT_USAGE,
    ] {
        // First line of each usage block, without the example
        println!("{}", usage.lines().next().unwrap_or(usage));
    }
    println!("  reload_env <{}...>", ReloadTarget::VALID.join("|"));
    println!("  refetch");
    println!("  login");
    println!("  exit / quit");
    Ok(())
}

/// Re-read `.env` and swap the named sections into the live config
pub async fn reload_env(services: &Services, keys: &[String]) -> CommandResult {
    let targets = ReloadTarget::parse_all(keys)?;
    Config::reload(&services.config, &targets).await
}

/// Log in again, prompting for a two-factor code if VRChat asks for one
pub async fn login(services: &Services) -> CommandResult {
    let user = services.session.login(Some(&services.input)).await?;
    info!("Session active for {}", user.display_name);
    Ok(())
}
