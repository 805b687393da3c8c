use crate::commands::input::OperatorInput;
use crate::config::Config;
use crate::error::RelayResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

// Export components
pub mod relay;
pub mod vrchat;
pub mod website;

pub use relay::{EventRelay, RelayHandle};
pub use vrchat::SessionKeeper;

/// Shared collaborators handed to every component
#[derive(Clone)]
pub struct Services {
    pub config: Arc<RwLock<Config>>,
    pub fetcher: vrchat::EventFetcher,
    pub session: Arc<dyn vrchat::SessionProvider>,
    pub forwarder: Arc<website::Forwarder>,
    pub relay: RelayHandle,
    pub input: OperatorInput,
}

/// Component trait that all components must implement
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Initialize the component
    async fn init(&self, services: &Services) -> RelayResult<()>;

    /// Shutdown the component
    async fn shutdown(&self) -> RelayResult<()>;
}

/// Manager for all components
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_count", &self.components.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
        }
    }

    /// Register a component
    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Initialize all enabled components
    pub async fn init_all(&self, services: &Services) -> RelayResult<()> {
        for component in &self.components {
            let enabled = self.config.read().await.is_component_enabled(component.name());
            if !enabled {
                info!("Component {} is disabled, skipping", component.name());
                continue;
            }

            info!("Initializing component: {}", component.name());

            if let Err(e) = component.init(services).await {
                // Log error but continue with other components
                error!("Error initializing component {}: {:?}", component.name(), e);
            }
        }

        Ok(())
    }

    /// Shutdown all components
    pub async fn shutdown_all(&self) -> RelayResult<()> {
        info!("Shutting down all components");

        for component in &self.components {
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                // Log error but continue with other components
                error!(
                    "Error shutting down component {}: {:?}",
                    component.name(),
                    e
                );
            }
        }

        Ok(())
    }
}
