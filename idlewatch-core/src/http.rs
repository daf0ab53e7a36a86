//! HTTP client abstraction for the activity sources.
//!
//! The Riot API and OP.GG sources only ever issue GET requests with a few
//! headers. Routing them through a trait lets tests feed canned payloads
//! without touching the network; the default implementation wraps reqwest.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

/// Status and body of a completed request. Non-2xx statuses are not errors at
/// this layer; callers decide what a 404 or 429 means for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
