//! Caller-side client for the proxy endpoints
//!
//! Shapes a `HoroscopeRequest` into the proxy's GET or POST form and
//! normalizes the reply into a typed response or a `ProxyError` carrying the
//! server's message and status.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::{BirthForm, BirthLocation, ErrorBody, PersonalizedRequest};
use crate::dispatcher::HoroscopeRequest;
use crate::error::ProxyError;
use crate::models::{GeoResult, HoroscopeApiResponse};
use crate::Result;

const HOROSCOPE_FALLBACK: &str = "Failed to load horoscope.";
const GEO_FALLBACK: &str = "Failed to search for cities";

pub struct ProxyClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_horoscope(&self, request: &HoroscopeRequest) -> Result<HoroscopeApiResponse> {
        let url = format!("{}/api/horoscope", self.base_url);

        let builder = match request {
            HoroscopeRequest::Generic { sign, date } => self
                .client
                .get(&url)
                .query(&[("sign", sign.slug), ("date", date.as_str())]),
            HoroscopeRequest::Personalized { birth, date } => {
                let body = PersonalizedRequest {
                    birth: Some(BirthForm {
                        date: Some(birth.date_string()),
                        time: Some(birth.time_string()),
                        location: Some(BirthLocation {
                            lat: birth.latitude,
                            lng: birth.longitude,
                            city: Some(birth.city.clone()),
                        }),
                    }),
                    date: Some(date.as_str().to_string()),
                };
                self.client.post(&url).json(&body)
            }
        };

        debug!(mode = ?request.mode(), "Fetching horoscope from proxy");

        let response = builder
            .send()
            .await
            .map_err(|e| ProxyError::Network(e.to_string()))?;

        let response = ensure_success(response, HOROSCOPE_FALLBACK).await?;
        Ok(response.json::<HoroscopeApiResponse>().await?)
    }

    pub async fn search_cities(&self, query: &str) -> Result<Vec<GeoResult>> {
        let response = self
            .client
            .get(format!("{}/api/geo", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ProxyError::Network(e.to_string()))?;

        let response = ensure_success(response, GEO_FALLBACK).await?;
        Ok(response.json::<GeoResponse>().await?.results)
    }
}

async fn ensure_success(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| fallback.to_string());

    Err(ProxyError::Proxy {
        status: status.as_u16(),
        message,
    })
}

//
// ================= Debounced City Search =================
//

/// Shortest query worth sending
pub const MIN_QUERY_LEN: usize = 2;

/// Quiet period a query must survive before it is sent
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[async_trait]
pub trait CityLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Vec<GeoResult>>;
}

#[async_trait]
impl CityLookup for ProxyClient {
    async fn lookup(&self, query: &str) -> Result<Vec<GeoResult>> {
        self.search_cities(query).await
    }
}

/// Search-as-you-type over a `CityLookup`.
///
/// Every call takes a monotonic ticket. A call only reaches the lookup if no
/// newer call arrived during the quiet window, and only delivers results if
/// no newer call arrived while it was in flight.
pub struct CitySearch {
    lookup: Arc<dyn CityLookup>,
    window: Duration,
    latest: AtomicU64,
}

impl CitySearch {
    pub fn new(lookup: Arc<dyn CityLookup>) -> Self {
        Self {
            lookup,
            window: DEBOUNCE_WINDOW,
            latest: AtomicU64::new(0),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// `Ok(None)` means a newer query superseded this one, whether the
    /// superseded lookup succeeded or failed.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<GeoResult>>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Some(Vec::new()));
        }

        tokio::time::sleep(self.window).await;
        if !self.is_current(ticket) {
            debug!(query, "City search superseded before sending");
            return Ok(None);
        }

        let outcome = self.lookup.lookup(query).await;
        if !self.is_current(ticket) {
            debug!(query, ok = outcome.is_ok(), "Discarding stale city search outcome");
            return Ok(None);
        }

        outcome.map(Some)
    }
}
