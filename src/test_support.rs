//! Shared fixtures for unit tests

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::ProxyError;
use crate::models::PersonalHoroscopePayload;
use crate::upstream::Upstream;
use crate::Result;

/// A complete upstream document matching the horoscope contract
pub fn sample_response() -> Value {
    json!({
        "meta": {
            "request_id": "req_7f3a",
            "generated_at": "2026-10-16T06:00:00Z",
            "settings": {
                "timezone": "UTC",
                "locale": "en",
                "date_resolved": "2026-10-16",
                "orb_policy": "standard"
            },
            "cache": { "hit": false, "ttl_seconds": 3600 },
            "engine": { "name": "astro-engine", "version": "2.1.0" }
        },
        "data": {
            "sign": "aries",
            "date": "2026-10-16",
            "scores": { "overall": 68, "love": 72, "career": 64, "money": 55.5, "health": 81 },
            "score_factors": [
                { "dimension": "love", "reason": "Venus trines your sun" },
                { "dimension": "overall", "reason": "A steady day" }
            ],
            "lucky": {
                "color": { "key": "red", "label": "Red" },
                "number": 7,
                "time_window": "14:00-16:00"
            },
            "content": {
                "text": "Momentum builds through the afternoon.",
                "theme": "Initiative",
                "keywords": ["drive", "clarity"],
                "do": ["Start the hard task first"],
                "dont": ["Argue over details"],
                "supporting_insights": ["The moon favours short trips"]
            },
            "astro": {
                "moon_sign": { "key": "leo", "label": "Leo" },
                "moon_phase": { "key": "waxing_gibbous", "label": "Waxing Gibbous" },
                "highlights": [
                    { "type": "sky_aspect", "key": "sun_trine_jupiter", "label": "Sun trine Jupiter" }
                ]
            },
            "personal": {
                "transits_top": [
                    {
                        "transit_planet": { "key": "mars", "label": "Mars" },
                        "natal_planet": { "key": "sun", "label": "Sun" },
                        "aspect": { "key": "square", "label": "Square" },
                        "orb_deg": 1.2,
                        "score": 86,
                        "explanation": {
                            "main": "Pressure to act.",
                            "supporting": ["Channel it into exercise"],
                            "tags": ["energy"]
                        },
                        "is_applying": true,
                        "exact_at": "2026-10-16T18:24:00Z"
                    },
                    {
                        "transit_planet": { "key": "venus", "label": "Venus" },
                        "natal_planet": { "key": "moon", "label": "Moon" },
                        "aspect": { "key": "trine", "label": "Trine" },
                        "orb_deg": -2.5,
                        "score": 61,
                        "explanation": "Easy warmth with people close to you.",
                        "is_applying": false,
                        "exact_at": null
                    }
                ],
                "focus_areas": ["relationships"],
                "confidence_score": 0.82
            }
        }
    })
}

#[derive(Debug, Clone)]
pub enum MockReply {
    Body(String),
    Status(u16, String),
    Unreachable,
}

/// Call-counting upstream that answers every call with the same reply
pub struct MockUpstream {
    reply: MockReply,
    calls: AtomicUsize,
    pub sign_requests: Mutex<Vec<(String, String)>>,
    pub personal_requests: Mutex<Vec<PersonalHoroscopePayload>>,
    pub geo_requests: Mutex<Vec<(String, u32)>>,
}

impl MockUpstream {
    pub fn replying(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            sign_requests: Mutex::new(Vec::new()),
            personal_requests: Mutex::new(Vec::new()),
            geo_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_json(body: &Value) -> Self {
        Self::replying(MockReply::Body(body.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Body(body) => Ok(body.clone()),
            MockReply::Status(status, body) => Err(ProxyError::Upstream {
                status: *status,
                body: body.clone(),
            }),
            MockReply::Unreachable => Err(ProxyError::Network("connection refused".into())),
        }
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn daily_sign(&self, sign: &str, date: &str) -> Result<String> {
        self.sign_requests
            .lock()
            .unwrap()
            .push((sign.to_string(), date.to_string()));
        self.answer()
    }

    async fn daily_personal(&self, payload: &PersonalHoroscopePayload) -> Result<String> {
        self.personal_requests.lock().unwrap().push(payload.clone());
        self.answer()
    }

    async fn geo_search(&self, query: &str, limit: u32) -> Result<String> {
        self.geo_requests
            .lock()
            .unwrap()
            .push((query.to_string(), limit));
        self.answer()
    }
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
