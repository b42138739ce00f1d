//! City search pass-through
//!
//! Forwards a place query to the upstream geocoder and returns its body
//! verbatim. No validation, no retry.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::upstream::Upstream;
use crate::Result;

pub const GEO_RESULT_LIMIT: u32 = 10;

pub struct GeoProxy {
    upstream: Arc<dyn Upstream>,
}

impl GeoProxy {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// An empty query short-circuits to an empty result set.
    pub async fn search(&self, query: &str) -> Result<Value> {
        if query.is_empty() {
            return Ok(json!({ "results": [], "count": 0 }));
        }

        debug!(query, "Searching cities");

        let body = self
            .upstream
            .geo_search(query, GEO_RESULT_LIMIT)
            .await
            .map_err(|e| {
                error!(error = %e, "Geocoding proxy error");
                e
            })?;

        Ok(serde_json::from_str::<Value>(&body).map_err(|e| {
            error!(error = %e, "Geocoder returned a non-JSON body");
            e
        })?)
    }
}
