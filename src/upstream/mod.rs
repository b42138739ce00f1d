//! Outbound seam to the astrology API
//!
//! `Upstream` hands back the raw body of a 2xx response. Decoding and
//! validation belong to the caller, so a mock can stand in for the network.

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::ProxyError;
use crate::models::PersonalHoroscopePayload;
use crate::Result;

pub const API_KEY_HEADER: &str = "x-api-key";

const SIGN_PATH: &str = "/api/v2/horoscope/daily/sign";
const PERSONAL_PATH: &str = "/api/v2/horoscope/daily/personal";
const GEO_PATH: &str = "/api/v1/geo/search";

/// Trait for the upstream astrology service
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Daily reading for a sign; `date` is `YYYY-MM-DD` or `today`
    async fn daily_sign(&self, sign: &str, date: &str) -> Result<String>;

    /// Personalized daily reading from birth details
    async fn daily_personal(&self, payload: &PersonalHoroscopePayload) -> Result<String>;

    /// Free-text place search
    async fn geo_search(&self, query: &str, limit: u32) -> Result<String>;
}

/// Reusable astrology API client (connection-pooled)
pub struct AstroApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AstroApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<String> {
        debug!(path, "Calling astrology API");

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ProxyError::Network(format!("{} request failed: {}", path, e)))?;

        read_body(path, response).await
    }
}

async fn read_body(path: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProxyError::Network(format!("{} body read failed: {}", path, e)))?;

    if !status.is_success() {
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[async_trait]
impl Upstream for AstroApiClient {
    async fn daily_sign(&self, sign: &str, date: &str) -> Result<String> {
        let request = self
            .client
            .get(self.url(SIGN_PATH))
            .header("Content-Type", "application/json")
            .query(&[("sign", sign), ("date", date)]);

        self.send(SIGN_PATH, request).await
    }

    async fn daily_personal(&self, payload: &PersonalHoroscopePayload) -> Result<String> {
        // Depends on exact birth coordinates; never served from a cache.
        let request = self
            .client
            .post(self.url(PERSONAL_PATH))
            .header(CACHE_CONTROL, "no-store")
            .json(payload);

        self.send(PERSONAL_PATH, request).await
    }

    async fn geo_search(&self, query: &str, limit: u32) -> Result<String> {
        let request = self
            .client
            .get(self.url(GEO_PATH))
            .query(&[("q", query.to_string()), ("limit", limit.to_string())]);

        self.send(GEO_PATH, request).await
    }
}
