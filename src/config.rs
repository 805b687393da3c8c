use crate::error::{config_error, env_error, RelayResult};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Default VRChat API root
pub const DEFAULT_VRCHAT_API_BASE: &str = "https://api.vrchat.cloud/api/1";

/// File holding component switches
pub const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the relay
#[derive(Clone)]
pub struct Config {
    /// VRChat username
    pub vrc_user: String,
    /// VRChat password
    pub vrc_pass: String,
    /// Expected VRChat user id of the logged-in account
    pub user_id: Option<String>,
    /// Website API key
    pub api_key: Option<String>,
    /// Base endpoint for event records on the website
    pub event_endpoint: Option<String>,
    /// Base endpoint for group records on the website
    pub group_endpoint: Option<String>,
    /// Operator contact, sent as the user agent
    pub contact: String,
    /// Groups polled for calendar events, in polling order
    pub group_ids: Vec<String>,
    /// VRChat API root
    pub vrchat_api_base: String,
    /// Dedup ledger location
    pub events_file: PathBuf,
    /// Cached session credential location
    pub session_file: PathBuf,
    pub poll_interval_secs: u64,
    pub reauth_interval_secs: u64,
    pub group_fetch_delay_ms: u64,
    pub forward_pacing_ms: u64,
    pub http_timeout_secs: u64,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vrc_user: String::new(),
            vrc_pass: String::new(),
            user_id: None,
            api_key: None,
            event_endpoint: None,
            group_endpoint: None,
            contact: String::new(),
            group_ids: Vec::new(),
            vrchat_api_base: DEFAULT_VRCHAT_API_BASE.to_string(),
            events_file: PathBuf::from("events.txt"),
            session_file: PathBuf::from("session.json"),
            poll_interval_secs: 900,
            reauth_interval_secs: 300,
            group_fetch_delay_ms: 1000,
            forward_pacing_ms: 2000,
            http_timeout_secs: 90,
            components: HashMap::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("vrc_user", &self.vrc_user)
            .field("vrc_pass", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("event_endpoint", &self.event_endpoint)
            .field("group_endpoint", &self.group_endpoint)
            .field("contact", &self.contact)
            .field("group_ids", &self.group_ids)
            .field("vrchat_api_base", &self.vrchat_api_base)
            .field("events_file", &self.events_file)
            .field("session_file", &self.session_file)
            .field("components", &self.components)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> RelayResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_env()?;

        // Required for talking to VRChat at all
        if config.vrc_user.is_empty() || config.vrc_pass.is_empty() {
            return Err(env_error("VRC_USER / VRC_PASS"));
        }
        if config.contact.is_empty() {
            return Err(env_error("CONTACT"));
        }

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string(COMPONENTS_FILE) {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            config.components.extend(file_components);
        }

        Ok(config)
    }

    /// Read every recognized key from the process environment.
    ///
    /// Missing credentials are left empty here; `load` decides what is fatal.
    pub fn from_env() -> RelayResult<Self> {
        let defaults = Config::default();

        Ok(Config {
            vrc_user: env::var("VRC_USER").unwrap_or_default(),
            vrc_pass: env::var("VRC_PASS").unwrap_or_default(),
            user_id: optional_var("USER_ID"),
            api_key: optional_var("API_KEY"),
            event_endpoint: optional_var("ENDPOINT_BASE_EVENT"),
            group_endpoint: optional_var("ENDPOINT_BASE_GROUP"),
            contact: env::var("CONTACT").unwrap_or_default().trim().to_string(),
            group_ids: parse_group_ids(&env::var("GROUP_ID").unwrap_or_default()),
            vrchat_api_base: optional_var("VRCHAT_API_BASE").unwrap_or(defaults.vrchat_api_base),
            events_file: optional_var("EVENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.events_file),
            session_file: optional_var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            poll_interval_secs: numeric_var("POLL_INTERVAL_SECS", defaults.poll_interval_secs)?,
            reauth_interval_secs: numeric_var(
                "REAUTH_INTERVAL_SECS",
                defaults.reauth_interval_secs,
            )?,
            group_fetch_delay_ms: numeric_var(
                "GROUP_FETCH_DELAY_MS",
                defaults.group_fetch_delay_ms,
            )?,
            forward_pacing_ms: numeric_var("FORWARD_PACING_MS", defaults.forward_pacing_ms)?,
            http_timeout_secs: numeric_var("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            components: HashMap::new(),
        })
    }

    /// Check if a component is enabled; components are on unless switched off
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&true)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reauth_interval(&self) -> Duration {
        Duration::from_secs(self.reauth_interval_secs)
    }

    pub fn group_fetch_delay(&self) -> Duration {
        Duration::from_millis(self.group_fetch_delay_ms)
    }

    pub fn forward_pacing(&self) -> Duration {
        Duration::from_millis(self.forward_pacing_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Copy the requested sections from a fresh snapshot.
    ///
    /// Returns a description of every section that changed hands.
    pub fn apply(&mut self, fresh: &Config, targets: &[ReloadTarget]) -> Vec<String> {
        let wants = |target: ReloadTarget| {
            targets.contains(&ReloadTarget::All) || targets.contains(&target)
        };
        let mut applied = Vec::new();

        if wants(ReloadTarget::ApiKey) {
            self.api_key = fresh.api_key.clone();
            applied.push("API_KEY".to_string());
        }

        if wants(ReloadTarget::GroupIds) {
            self.group_ids = fresh.group_ids.clone();
            applied.push(format!("GROUP_IDS: {:?}", self.group_ids));
        }

        if wants(ReloadTarget::Endpoints) {
            self.event_endpoint = fresh.event_endpoint.clone();
            self.group_endpoint = fresh.group_endpoint.clone();
            applied.push(format!(
                "ENDPOINTS: event={} group={}",
                self.event_endpoint.as_deref().unwrap_or("<unset>"),
                self.group_endpoint.as_deref().unwrap_or("<unset>")
            ));
        }

        if wants(ReloadTarget::Credentials) {
            self.vrc_user = fresh.vrc_user.clone();
            self.vrc_pass = fresh.vrc_pass.clone();
            self.user_id = fresh.user_id.clone();
            applied.push("VRChat credentials".to_string());
        }

        if wants(ReloadTarget::Contact) {
            self.contact = fresh.contact.clone();
            applied.push(format!("CONTACT: {}", self.contact));
        }

        applied
    }

    /// Re-read `.env` and swap the requested sections into the shared config.
    ///
    /// The new values are read before the write lock is taken, so readers see
    /// either the old or the new configuration, never a mix.
    pub async fn reload(shared: &RwLock<Config>, targets: &[ReloadTarget]) -> RelayResult<()> {
        if targets.is_empty() {
            return Err(config_error(&format!(
                "No reload targets provided. Valid: {}",
                ReloadTarget::VALID.join(", ")
            )));
        }

        dotenvy::dotenv_override().ok();
        let fresh = Config::from_env()?;

        let applied = {
            let mut config = shared.write().await;
            config.apply(&fresh, targets)
        };

        for section in &applied {
            info!("Reloaded {}", section);
        }

        if targets.contains(&ReloadTarget::Credentials) || targets.contains(&ReloadTarget::All) {
            if fresh.vrc_user.is_empty() || fresh.vrc_pass.is_empty() {
                warn!("VRChat credentials are empty after reload");
            }
        }

        info!("Reload complete");
        Ok(())
    }
}

/// Sections of the configuration that can be reloaded at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTarget {
    ApiKey,
    GroupIds,
    Endpoints,
    Credentials,
    Contact,
    All,
}

impl ReloadTarget {
    pub const VALID: &'static [&'static str] =
        &["api_key", "group_ids", "endpoints", "vrchat", "contact", "all"];

    /// Parse every name, rejecting the whole list if any one is unknown
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> RelayResult<Vec<ReloadTarget>> {
        let mut targets = Vec::new();
        let mut invalid = Vec::new();

        for name in names {
            match name.as_ref().parse::<ReloadTarget>() {
                Ok(target) => targets.push(target),
                Err(_) => invalid.push(name.as_ref().to_string()),
            }
        }

        if !invalid.is_empty() {
            return Err(config_error(&format!(
                "Invalid reload key(s): {:?}. Valid: {}",
                invalid,
                ReloadTarget::VALID.join(", ")
            )));
        }

        Ok(targets)
    }
}

impl FromStr for ReloadTarget {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api_key" => Ok(ReloadTarget::ApiKey),
            "group_ids" | "group_id" => Ok(ReloadTarget::GroupIds),
            "endpoints" | "endpoint" => Ok(ReloadTarget::Endpoints),
            "vrchat" | "credentials" => Ok(ReloadTarget::Credentials),
            "contact" => Ok(ReloadTarget::Contact),
            "all" => Ok(ReloadTarget::All),
            other => Err(config_error(&format!("Unknown reload key: {}", other))),
        }
    }
}

/// Split a comma separated group list, dropping blanks
pub fn parse_group_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric_var(name: &str, default: u64) -> RelayResult<u64> {
    match optional_var(name) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| config_error(&format!("Invalid {} format: {}", name, value))),
        None => Ok(default),
    }
}
