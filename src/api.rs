//! REST API Server for the horoscope proxy
//!
//! The only server-side trust boundary: every caller parameter is checked
//! here before anything goes upstream.
//!
//! GET  /api/horoscope?sign=&date=   generic reading
//! POST /api/horoscope               personalized reading
//! GET  /api/geo?q=                  city search

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatcher::{parse_birth_form, Dispatcher, HoroscopeRequest, Reading};
use crate::error::{ProxyError, READING_UNAVAILABLE, REQUEST_FAILED};
use crate::geo::GeoProxy;
use crate::upstream::Upstream;

/// Downstream caches may keep a reading for an hour and serve it stale for a day.
pub const READING_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

const MISSING_BIRTH_DETAILS: &str = "Missing birth details";
const GEO_FAILED: &str = "Failed to search for cities";

/// =============================
/// Request Models
/// =============================

/// Query string pairs in arrival order.
///
/// A repeated key resolves to its first value.
#[derive(Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn from_extracted(
        query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
    ) -> crate::Result<Self> {
        query
            .map(|Query(pairs)| QueryParams(pairs))
            .map_err(|rejection| ProxyError::InvalidInput(rejection.body_text()))
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<BirthForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<BirthLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// =============================
/// Response Helpers
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn reading_response(reading: Reading) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, READING_CACHE_CONTROL)],
        Json(reading.document),
    )
        .into_response()
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    pub geo: Arc<GeoProxy>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Horoscope Endpoints
/// =============================

async fn get_horoscope(
    State(state): State<ApiState>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let request = match QueryParams::from_extracted(query)
        .and_then(|params| HoroscopeRequest::generic(params.first("sign"), params.first("date")))
    {
        Ok(request) => request,
        Err(e) => {
            warn!(%request_id, error = %e, "Rejected sign horoscope request");
            return error_response(e.status_code(), e.user_message(READING_UNAVAILABLE));
        }
    };

    info!(%request_id, "Sign horoscope request accepted");

    match state.dispatcher.dispatch(&request).await {
        Ok(response) => reading_response(response),
        Err(e) => {
            warn!(%request_id, kind = e.kind().as_str(), "Sign horoscope request failed");
            error_response(e.status_code(), e.user_message(READING_UNAVAILABLE))
        }
    }
}

/// Validate the personalized body into a request, without touching upstream.
fn personalized_request(body: PersonalizedRequest) -> crate::Result<HoroscopeRequest> {
    let missing = || ProxyError::InvalidInput(MISSING_BIRTH_DETAILS.to_string());

    let birth = body.birth.ok_or_else(missing)?;
    let (date, time, location) = match (birth.date, birth.time, birth.location) {
        (Some(date), Some(time), Some(location)) if !date.is_empty() && !time.is_empty() => {
            (date, time, location)
        }
        _ => return Err(missing()),
    };

    let birth = parse_birth_form(
        &date,
        &time,
        location.lat,
        location.lng,
        location.city.as_deref(),
    )?;

    HoroscopeRequest::personalized(birth, body.date.as_deref())
}

async fn post_horoscope(
    State(state): State<ApiState>,
    payload: Result<Json<PersonalizedRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let request = match payload
        .map_err(|rejection| ProxyError::InvalidInput(rejection.body_text()))
        .and_then(|Json(body)| personalized_request(body))
    {
        Ok(request) => request,
        Err(e) => {
            warn!(%request_id, error = %e, "Rejected personalized horoscope request");
            return error_response(StatusCode::BAD_REQUEST, e.user_message(REQUEST_FAILED));
        }
    };

    info!(%request_id, "Personalized horoscope request accepted");

    match state.dispatcher.dispatch(&request).await {
        Ok(response) => reading_response(response),
        Err(e) => {
            warn!(%request_id, kind = e.kind().as_str(), "Personalized horoscope request failed");
            // Upstream statuses are not echoed on this path.
            let status = match e {
                ProxyError::ContractViolation(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.user_message(REQUEST_FAILED))
        }
    }
}

/// =============================
/// Geo Endpoint
/// =============================

async fn search_cities(
    State(state): State<ApiState>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let params = match QueryParams::from_extracted(query) {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "Rejected city search");
            return error_response(StatusCode::BAD_REQUEST, GEO_FAILED);
        }
    };

    match state.geo.search(params.first("q").unwrap_or_default()).await {
        Ok(results) => Json(results).into_response(),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, GEO_FAILED),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(upstream: Arc<dyn Upstream>) -> Router {
    let state = ApiState {
        dispatcher: Arc::new(Dispatcher::new(upstream.clone())),
        geo: Arc::new(GeoProxy::new(upstream)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/horoscope", get(get_horoscope).post(post_horoscope))
        .route("/api/geo", get(search_cities))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    upstream: Arc<dyn Upstream>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(upstream);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("Horoscope proxy listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
