use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the relay
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(vrc_relay::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(vrc_relay::config))]
    Config(String),

    #[error("VRChat API error: {0}")]
    #[diagnostic(code(vrc_relay::upstream))]
    Upstream(String),

    #[error("Two-factor authentication required ({0})")]
    #[diagnostic(
        code(vrc_relay::two_factor),
        help("run `login` in the console to enter the code")
    )]
    TwoFactorRequired(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(vrc_relay::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(vrc_relay::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(vrc_relay::http))]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    #[diagnostic(code(vrc_relay::url))]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(vrc_relay::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(vrc_relay::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type RelayResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create VRChat API errors
pub fn upstream_error(message: &str) -> Error {
    Error::Upstream(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
