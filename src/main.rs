mod shutdown;
mod startup;

use std::time::Duration;
use tracing::info;
use vrc_event_relay::error::Error;

fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting VRChat event relay");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::from)?;

    let result = runtime.block_on(async {
        // Load configuration
        let config = startup::load_config().await?;

        // Start polling, the session keeper and the console
        startup::start_relay(config).await
    });

    // A console read may still be parked on stdin
    runtime.shutdown_timeout(Duration::from_secs(1));

    result
}
