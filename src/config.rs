//! Runtime configuration
//!
//! Built once at startup from the environment and handed to the components
//! that need it. Nothing reads the environment after that.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::ProxyError;

pub const DEFAULT_BASE_URL: &str = "https://astro-api-1qnc.onrender.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream astrology API base, without trailing slash
    pub base_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub port: u16,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key)
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load `.env` (if any) and read the upstream settings.
    ///
    /// A missing API key is tolerated; requests go out without the header.
    pub fn from_env() -> crate::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let base_url =
            var("FREEASTROAPI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Config::new(base_url);

        match var("FREEASTROAPI_API_KEY") {
            Some(key) => config = config.with_api_key(key),
            None => warn!("FREEASTROAPI_API_KEY not set; upstream calls go out without x-api-key"),
        }

        if let Some(secs) = var("FREEASTROAPI_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ProxyError::InvalidInput(format!(
                    "FREEASTROAPI_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    secs
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.port = var("PORT")
            .or_else(|| var("API_PORT"))
            .map(|p| {
                p.trim()
                    .parse::<u16>()
                    .map_err(|_| ProxyError::InvalidInput(format!("Invalid port: {:?}", p)))
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
