use std::sync::Arc;
use tokio::sync::RwLock;
use vrc_event_relay::commands::input::OperatorInput;
use vrc_event_relay::components::vrchat::{SessionProvider, VrchatClient};
use vrc_event_relay::config::Config;
use vrc_event_relay::error::RelayResult;

/// Log in once, answering any two-factor prompt, and cache the session for the relay
#[tokio::main(flavor = "current_thread")]
async fn main() -> RelayResult<()> {
    // Load configuration
    let config = Config::load()?;
    let session_file = config.session_file.clone();
    let config = Arc::new(RwLock::new(config));

    let client = VrchatClient::new(config).await?;
    if client.restore_session().await? {
        println!("Found a cached session, checking it is still valid...");
    }

    let input = OperatorInput::stdin();
    let user = client.login(Some(&input)).await?;

    println!(
        "Logged in as {} ({}). Session saved to {}",
        user.display_name,
        user.id,
        session_file.display()
    );

    Ok(())
}
