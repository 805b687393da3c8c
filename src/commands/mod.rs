use crate::components::{Component, Services};
use crate::error::RelayResult;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// Export submodules
pub mod input;
pub mod parser;
mod events;
mod groups;
mod util;

pub use parser::{Command, ParseError};

/// Type alias for command result
pub type CommandResult = RelayResult<()>;

/// Whether the console keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Run one parsed command against the shared services
pub async fn execute(services: &Services, command: Command) -> RelayResult<Flow> {
    match command {
        Command::Help => util::help()?,
        Command::Exit => return Ok(Flow::Exit),
        Command::ReloadEnv(keys) => util::reload_env(services, &keys).await?,
        Command::Login => util::login(services).await?,
        Command::AddGroup(group_id) => groups::add_group(services, &group_id).await?,
        Command::UpdateGroup(group_id) => groups::update_group(services, &group_id).await?,
        Command::DeleteGroup(group_id) => groups::delete_group(services, &group_id).await?,
        Command::Refetch => events::refetch(services).await?,
        Command::AddEvent(event) => events::add_event(services, &event).await?,
        Command::UpdateEvent { website_id, event } => {
            events::update_event(services, &website_id, &event).await?
        }
        Command::DeleteEvent(website_id) => events::delete_event(services, &website_id).await?,
    }

    Ok(Flow::Continue)
}

/// Read and run commands until `exit` or end of input
pub async fn run_console(services: Services) -> RelayResult<()> {
    loop {
        let Some(line) = services.input.read_line("> ").await? else {
            info!("Console input closed");
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(ParseError::Usage(usage)) => {
                println!("Usage:\n{}", usage);
                continue;
            }
            Err(ParseError::Unknown(_)) => {
                println!("Unknown command. Type 'help' for options.");
                continue;
            }
        };

        match execute(&services, command).await {
            Ok(Flow::Exit) => return Ok(()),
            Ok(Flow::Continue) => {}
            // A failed command never ends the console
            Err(e) => error!("Command failed: {}", e),
        }
    }
}

/// Interactive operator console on standard input
pub struct Console {
    task: RwLock<Option<JoinHandle<()>>>,
    exit: CancellationToken,
}

impl Console {
    /// `exit` is cancelled when the operator leaves the console
    pub fn new(exit: CancellationToken) -> Self {
        Self {
            task: RwLock::new(None),
            exit,
        }
    }
}

#[async_trait]
impl Component for Console {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn init(&self, services: &Services) -> RelayResult<()> {
        let mut task = self.task.write().await;
        if task.is_some() {
            return Ok(());
        }

        let services = services.clone();
        let exit = self.exit.clone();
        *task = Some(tokio::spawn(async move {
            if let Err(e) = run_console(services).await {
                error!("Console stopped: {:?}", e);
            }
            exit.cancel();
        }));

        Ok(())
    }

    async fn shutdown(&self) -> RelayResult<()> {
        if let Some(task) = self.task.write().await.take() {
            task.abort();
        }
        Ok(())
    }
}
