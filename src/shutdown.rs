use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vrc_event_relay::components::{ComponentManager, RelayHandle};
use vrc_event_relay::error::RelayResult;

#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Wait for a termination signal or a console `exit`, then stop everything
pub async fn handle_signals(
    shutdown_send: oneshot::Sender<()>,
    component_manager: Arc<ComponentManager>,
    relay: RelayHandle,
    console_exit: CancellationToken,
) {
    tokio::select! {
        result = wait_for_signal() => {
            if let Err(e) = result {
                // Without signal handlers only the console can stop us
                error!("Failed to install signal handlers: {:?}", e);
                console_exit.cancelled().await;
                info!("Console exit requested, initiating graceful shutdown");
            }
        }
        _ = console_exit.cancelled() => {
            info!("Console exit requested, initiating graceful shutdown");
        }
    }

    // Shut down all components
    if let Err(e) = component_manager.shutdown_all().await {
        error!("Error shutting down components: {:?}", e);
    } else {
        info!("All components shut down successfully");
    }

    // The relay component may be disabled, so stop the actor here too
    if let Err(e) = relay.shutdown().await {
        error!("Error shutting down relay actor: {:?}", e);
    } else {
        info!("Relay actor shut down successfully");
    }

    // Send shutdown signal to main task
    let _ = shutdown_send.send(());
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> RelayResult<()> {
    // Handle SIGTERM (sent by Kubernetes when pod is terminating)
    let mut sigterm = signal(SignalKind::terminate())?;
    // Handle SIGINT (Ctrl+C)
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }

    Ok(())
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> RelayResult<()> {
    // Handle Ctrl+C
    let mut ctrlc = ctrl_c()?;
    // Handle Ctrl+Break
    let mut ctrlbreak = ctrl_break()?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }

    Ok(())
}
