use crate::shutdown;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vrc_event_relay::commands::input::OperatorInput;
use vrc_event_relay::commands::Console;
use vrc_event_relay::components::relay::Ledger;
use vrc_event_relay::components::vrchat::{EventFetcher, SessionProvider, VrchatClient};
use vrc_event_relay::components::website::{Forwarder, HttpTransport};
use vrc_event_relay::components::{
    ComponentManager, EventRelay, RelayHandle, Services, SessionKeeper,
};
use vrc_event_relay::config::Config;
use vrc_event_relay::error::Error;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the services together, start the components and wait for shutdown
pub async fn start_relay(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (events_file, http_timeout, group_count) = {
        let config_read = config.read().await;
        (
            config_read.events_file.clone(),
            config_read.http_timeout(),
            config_read.group_ids.len(),
        )
    };

    if group_count == 0 {
        warn!("GROUP_ID is empty, poll cycles will fetch nothing");
    }

    let input = OperatorInput::stdin();

    // Log in before anything polls so a two-factor prompt is answered up front
    let client = Arc::new(VrchatClient::new(Arc::clone(&config)).await?);
    if let Err(e) = client.restore_session().await {
        warn!("Ignoring unreadable session cache: {}", e);
    }
    match client.login(Some(&input)).await {
        Ok(user) => info!("Logged in to VRChat as {}", user.display_name),
        Err(e) => error!("Initial VRChat login failed: {}", e),
    }

    let transport = Arc::new(HttpTransport::new(http_timeout)?);
    let forwarder = Arc::new(Forwarder::new(Arc::clone(&config), transport));
    let fetcher = EventFetcher::new(client.clone());
    let ledger = Ledger::new(events_file);
    let relay = RelayHandle::new(
        Arc::clone(&config),
        ledger,
        fetcher.clone(),
        Arc::clone(&forwarder),
    );

    let services = Services {
        config: Arc::clone(&config),
        fetcher,
        session: client,
        forwarder,
        relay: relay.clone(),
        input,
    };

    // Cancelled when the operator types `exit`
    let console_exit = CancellationToken::new();

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(SessionKeeper::new());
    component_manager.register(EventRelay::new());
    component_manager.register(Console::new(console_exit.clone()));

    let component_manager = Arc::new(component_manager);
    component_manager.init_all(&services).await?;

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, relay, console_exit).await;
    });

    info!("Relay running, type 'help' for console commands");

    if shutdown_recv.await.is_err() {
        error!("Shutdown handler ended without signalling");
    }
    info!("Shutdown complete");

    Ok(())
}
