use crate::error::RelayResult;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Header carrying the website API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP verbs the website API is called with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Post => f.write_str("POST"),
            HttpMethod::Put => f.write_str("PUT"),
            HttpMethod::Delete => f.write_str("DELETE"),
        }
    }
}

/// One call to the website API
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub api_key: String,
    pub contact: String,
    pub body: Option<Value>,
}

/// Status and raw body of a website response
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// The website only counts 200 and 201 as success
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Body for logging, pretty-printed when it is JSON
    pub fn display_body(&self) -> String {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| self.body.clone()),
            Err(_) if self.body.trim().is_empty() => "<no response body>".to_string(),
            Err(_) => self.body.clone(),
        }
    }
}

/// Sends requests to the website
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport failures are errors; any HTTP status is a response
    async fn send(&self, request: OutboundRequest) -> RelayResult<TransportResponse>;
}

/// `reqwest` backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> RelayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> RelayResult<TransportResponse> {
        let builder = match request.method {
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        let mut builder = builder
            .header(API_KEY_HEADER, &request.api_key)
            .header(USER_AGENT, &request.contact);

        // `json` also sets the content-type header
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(TransportResponse { status, body })
    }
}
