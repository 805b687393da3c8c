use super::models::CurrentUser;
use crate::error::RelayResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Cookie carrying the VRChat session
pub const AUTH_COOKIE: &str = "auth";
/// Cookie proving a completed two-factor challenge
pub const TWO_FACTOR_COOKIE: &str = "twoFactorAuth";

/// Session credential, cached on disk as `{"auth": "<token>"}`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub auth: String,
    #[serde(
        rename = "twoFactorAuth",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub two_factor_auth: Option<String>,
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("auth", &"<redacted>")
            .field("two_factor_auth", &self.two_factor_auth.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SessionCredential {
    pub fn new(auth: impl Into<String>) -> Self {
        Self {
            auth: auth.into(),
            two_factor_auth: None,
        }
    }

    /// Value for the `Cookie` request header
    pub fn cookie_header(&self) -> String {
        match &self.two_factor_auth {
            Some(two_factor) => format!(
                "{}={}; {}={}",
                AUTH_COOKIE, self.auth, TWO_FACTOR_COOKIE, two_factor
            ),
            None => format!("{}={}", AUTH_COOKIE, self.auth),
        }
    }

    /// Pick up refreshed cookies from a response
    pub fn absorb(&mut self, headers: &HeaderMap) {
        if let Some(auth) = cookie_value(headers, AUTH_COOKIE) {
            self.auth = auth;
        }
        if let Some(two_factor) = cookie_value(headers, TWO_FACTOR_COOKIE) {
            self.two_factor_auth = Some(two_factor);
        }
    }

    /// Load a cached credential; a missing file is simply no credential
    pub async fn load(path: &Path) -> RelayResult<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let credential: SessionCredential = serde_json::from_str(&content)?;
                if credential.auth.is_empty() {
                    return Ok(None);
                }
                debug!("Loaded cached session from {}", path.display());
                Ok(Some(credential))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the credential cache
    pub async fn save(&self, path: &Path) -> RelayResult<()> {
        let json = serde_json::to_string(self)?;
        tokio::fs::write(path, json).await?;
        info!("Session cached to {}", path.display());
        Ok(())
    }
}

/// Second factors VRChat may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorMethod {
    EmailOtp,
    Totp,
    Otp,
}

impl TwoFactorMethod {
    /// Choose the method to answer from the factors VRChat offers
    pub fn choose(offered: &[String]) -> Option<Self> {
        [Self::EmailOtp, Self::Totp, Self::Otp]
            .into_iter()
            .find(|method| offered.iter().any(|f| f == method.api_name()))
    }

    /// Name used in the `requiresTwoFactorAuth` list
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::EmailOtp => "emailOtp",
            Self::Totp => "totp",
            Self::Otp => "otp",
        }
    }

    /// Path segment of the verify endpoint
    pub fn verify_path(&self) -> &'static str {
        match self {
            Self::EmailOtp => "emailotp",
            Self::Totp => "totp",
            Self::Otp => "otp",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::EmailOtp => "Enter your VRChat Email 2FA code: ",
            Self::Totp => "Enter your VRChat Authenticator code: ",
            Self::Otp => "Enter a VRChat recovery code: ",
        }
    }
}

/// Supplies two-factor codes, typically by asking the operator
#[async_trait]
pub trait ChallengeResponder: Send + Sync {
    async fn respond(&self, method: TwoFactorMethod) -> RelayResult<String>;
}

/// Something that can establish or refresh the upstream session.
///
/// Without a responder a two-factor challenge fails with
/// `Error::TwoFactorRequired` instead of prompting.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn login(&self, responder: Option<&dyn ChallengeResponder>) -> RelayResult<CurrentUser>;
}

/// Extract a cookie value from `Set-Cookie` response headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
