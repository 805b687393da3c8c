use super::fetcher::CalendarSource;
use super::models::{CalendarPage, CurrentUser, RawCalendarEvent, RawGroup};
use super::session::{
    cookie_value, ChallengeResponder, SessionCredential, SessionProvider, TwoFactorMethod,
    AUTH_COOKIE,
};
use crate::config::Config;
use crate::error::{config_error, env_error, upstream_error, Error, RelayResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

/// Events requested per listing page
const PAGE_SIZE: usize = 100;
/// Upper bound on listing pages per group
const MAX_CALENDAR_PAGES: usize = 10;

/// Body of `GET /auth/user`: either a challenge or the user
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Challenge {
        #[serde(rename = "requiresTwoFactorAuth")]
        requires_two_factor_auth: Vec<String>,
    },
    User(CurrentUser),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    verified: bool,
}

enum AuthState {
    LoggedIn(CurrentUser),
    Challenge(Vec<String>),
    Unauthorized,
}

/// Authenticated client for the VRChat API
pub struct VrchatClient {
    config: Arc<RwLock<Config>>,
    client: Client,
    base: Url,
    session: RwLock<Option<SessionCredential>>,
    session_file: PathBuf,
}

impl VrchatClient {
    /// Build a client from the current configuration
    pub async fn new(config: Arc<RwLock<Config>>) -> RelayResult<Self> {
        let (timeout, base, session_file) = {
            let config_read = config.read().await;
            (
                config_read.http_timeout(),
                config_read.vrchat_api_base.clone(),
                config_read.session_file.clone(),
            )
        };

        let client = Client::builder().timeout(timeout).build()?;
        let base = Url::parse(&base)?;
        if base.cannot_be_a_base() {
            return Err(config_error("VRCHAT_API_BASE must be an http(s) URL"));
        }

        Ok(Self {
            config,
            client,
            base,
            session: RwLock::new(None),
            session_file,
        })
    }

    /// Restore the cached session credential, if any
    pub async fn restore_session(&self) -> RelayResult<bool> {
        match SessionCredential::load(&self.session_file).await? {
            Some(credential) => {
                *self.session.write().await = Some(credential);
                info!("Restored cached VRChat session");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether a session credential is currently held
    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    fn endpoint(&self, segments: &[&str]) -> RelayResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| config_error("VRCHAT_API_BASE cannot take path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let contact = self.config.read().await.contact.clone();
        let mut builder = self.client.request(method, url).header(USER_AGENT, contact);

        if let Some(session) = self.session.read().await.as_ref() {
            builder = builder.header(COOKIE, session.cookie_header());
        }

        builder
    }

    async fn absorb_cookies(&self, headers: &HeaderMap) {
        let mut session = self.session.write().await;
        match session.as_mut() {
            Some(credential) => credential.absorb(headers),
            None => {
                if let Some(auth) = cookie_value(headers, AUTH_COOKIE) {
                    let mut credential = SessionCredential::new(auth);
                    credential.absorb(headers);
                    *session = Some(credential);
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> RelayResult<T> {
        let path = url.path().to_string();
        let response = self.request(Method::GET, url).await.send().await?;
        self.absorb_cookies(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(upstream_error(&format!(
                "GET {} failed: HTTP {} - {}",
                path, status, error_body
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn basic_auth(&self) -> RelayResult<String> {
        let (user, pass) = {
            let config_read = self.config.read().await;
            (config_read.vrc_user.clone(), config_read.vrc_pass.clone())
        };
        if user.is_empty() || pass.is_empty() {
            return Err(env_error("VRC_USER / VRC_PASS"));
        }

        let pair = format!(
            "{}:{}",
            urlencoding::encode(&user),
            urlencoding::encode(&pass)
        );
        Ok(format!("Basic {}", STANDARD.encode(pair)))
    }

    async fn fetch_current_user(&self, basic: Option<String>) -> RelayResult<AuthState> {
        let url = self.endpoint(&["auth", "user"])?;
        let mut builder = self.request(Method::GET, url).await;
        if let Some(basic) = basic {
            builder = builder.header(AUTHORIZATION, basic);
        }

        let response = builder.send().await?;
        self.absorb_cookies(response.headers()).await;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(AuthState::Unauthorized);
        }
        if !status.is_success() {
            return Err(upstream_error(&format!("GET /auth/user failed: HTTP {}", status)));
        }

        match response.json::<AuthResponse>().await? {
            AuthResponse::Challenge {
                requires_two_factor_auth,
            } => Ok(AuthState::Challenge(requires_two_factor_auth)),
            AuthResponse::User(user) => Ok(AuthState::LoggedIn(user)),
        }
    }

    async fn complete_challenge(
        &self,
        offered: Vec<String>,
        responder: Option<&dyn ChallengeResponder>,
    ) -> RelayResult<CurrentUser> {
        let method = TwoFactorMethod::choose(&offered).ok_or_else(|| {
            upstream_error(&format!("Unsupported two-factor methods: {:?}", offered))
        })?;

        let Some(responder) = responder else {
            return Err(Error::TwoFactorRequired(method.api_name().to_string()));
        };

        let code = responder.respond(method).await?;
        let url = self.endpoint(&["auth", "twofactorauth", method.verify_path(), "verify"])?;
        let response = self
            .request(Method::POST, url)
            .await
            .json(&json!({ "code": code.trim() }))
            .send()
            .await?;
        self.absorb_cookies(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error(&format!(
                "Two-factor verification failed: HTTP {}",
                status
            )));
        }

        let verify: VerifyResponse = response.json().await?;
        if !verify.verified {
            return Err(upstream_error("Two-factor code was not accepted"));
        }

        match self.fetch_current_user(None).await? {
            AuthState::LoggedIn(user) => self.finish_login(user).await,
            _ => Err(upstream_error(
                "Session was not accepted after two-factor verification",
            )),
        }
    }

    async fn finish_login(&self, user: CurrentUser) -> RelayResult<CurrentUser> {
        info!("Logged in as {}", user.display_name);

        let expected = self.config.read().await.user_id.clone();
        if let Some(expected) = expected {
            if expected != user.id {
                warn!(
                    "Logged in as {} but USER_ID is configured as {}",
                    user.id, expected
                );
            }
        }

        let credential = self.session.read().await.clone();
        if let Some(credential) = credential {
            if let Err(e) = credential.save(&self.session_file).await {
                error!("Failed to cache session: {}", e);
            }
        }

        Ok(user)
    }
}

#[async_trait]
impl SessionProvider for VrchatClient {
    async fn login(&self, responder: Option<&dyn ChallengeResponder>) -> RelayResult<CurrentUser> {
        // Reuse the held session when VRChat still accepts it
        if self.has_session().await {
            match self.fetch_current_user(None).await? {
                AuthState::LoggedIn(user) => return self.finish_login(user).await,
                AuthState::Challenge(offered) => {
                    return self.complete_challenge(offered, responder).await
                }
                AuthState::Unauthorized => {
                    debug!("Held session was rejected, logging in with credentials");
                }
            }
        }

        *self.session.write().await = None;
        let basic = self.basic_auth().await?;

        match self.fetch_current_user(Some(basic)).await? {
            AuthState::LoggedIn(user) => self.finish_login(user).await,
            AuthState::Challenge(offered) => self.complete_challenge(offered, responder).await,
            AuthState::Unauthorized => {
                Err(upstream_error("Login failed: invalid VRChat credentials"))
            }
        }
    }
}

#[async_trait]
impl CalendarSource for VrchatClient {
    async fn list_events(&self, group_id: &str) -> RelayResult<Vec<RawCalendarEvent>> {
        let mut events = Vec::new();

        for page_index in 0..MAX_CALENDAR_PAGES {
            let mut url = self.endpoint(&["calendar", group_id])?;
            url.query_pairs_mut()
                .append_pair("n", &PAGE_SIZE.to_string())
                .append_pair("offset", &(page_index * PAGE_SIZE).to_string());

            let page: CalendarPage = self.get_json(url).await?;
            let done = !page.has_next || page.results.is_empty();
            events.extend(page.results);

            if done {
                break;
            }
        }

        Ok(events)
    }

    async fn get_event(&self, group_id: &str, event_id: &str) -> RelayResult<RawCalendarEvent> {
        let url = self.endpoint(&["calendar", group_id, event_id])?;
        self.get_json(url).await
    }

    async fn get_group(&self, group_id: &str) -> RelayResult<RawGroup> {
        let url = self.endpoint(&["groups", group_id])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn client_for(base: &str) -> VrchatClient {
        let config = Config {
            vrchat_api_base: base.to_string(),
            vrc_user: "user name".to_string(),
            vrc_pass: "p@ss:word".to_string(),
            ..Config::default()
        };
        VrchatClient::new(Arc::new(RwLock::new(config))).await.unwrap()
    }

    #[tokio::test]
    async fn test_endpoint_appends_escaped_segments() {
        let client = client_for("https://api.vrchat.cloud/api/1/").await;
        let url = client.endpoint(&["calendar", "grp_1", "cal 2"]).unwrap();
        assert_eq!(url.as_str(), "https://api.vrchat.cloud/api/1/calendar/grp_1/cal%202");
    }

    #[tokio::test]
    async fn test_basic_auth_encodes_credentials() {
        let client = client_for("https://api.vrchat.cloud/api/1").await;
        let header = client.basic_auth().await.unwrap();
        let decoded = STANDARD
            .decode(header.trim_start_matches("Basic "))
            .unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "user%20name:p%40ss%3Aword");
    }

    #[test]
    fn test_auth_response_variants() {
        let challenge: AuthResponse =
            serde_json::from_str(r#"{"requiresTwoFactorAuth":["emailOtp"]}"#).unwrap();
        assert!(matches!(challenge, AuthResponse::Challenge { .. }));

        let user: AuthResponse =
            serde_json::from_str(r#"{"id":"usr_1","displayName":"Relay","bio":""}"#).unwrap();
        assert!(matches!(user, AuthResponse::User(u) if u.display_name == "Relay"));
    }
}
