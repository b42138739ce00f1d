//! Request dispatcher
//!
//! Turns a caller's intent into exactly one upstream call:
//! - Generic: keyed by sign and date (idempotent GET, cacheable)
//! - Personalized: keyed by birth date, time and location (POST, never cached)
//!
//! The raw reply is decoded and checked against the horoscope contract.
//! Failures are logged here in full; callers only get the error value.

use chrono::{Local, NaiveDate, NaiveTime, Timelike, Datelike};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ProxyError;
use crate::models::{BirthDetails, HoroscopeApiResponse, PersonalHoroscopePayload};
use crate::schema::{validate_response, SchemaIssue, Validation};
use crate::signs::{get_sign, ZodiacSign};
use crate::upstream::Upstream;
use crate::Result;

pub const TODAY: &str = "today";

/// City recorded when the caller's location carries no name
const UNKNOWN_CITY: &str = "Unknown";

lazy_static! {
    static ref DATE_PATTERN: Regex =
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles");
}

//
// ================= Reading Date =================
//

/// Target date of a reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingDate {
    Today,
    /// Already matched `YYYY-MM-DD`
    On(String),
}

impl ReadingDate {
    /// Absent or empty means today.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            None | Some("") | Some(TODAY) => Ok(ReadingDate::Today),
            Some(date) if DATE_PATTERN.is_match(date) => Ok(ReadingDate::On(date.to_string())),
            Some(other) => Err(ProxyError::InvalidInput(format!(
                "Invalid date format: \"{}\". Use YYYY-MM-DD or \"today\".",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReadingDate::Today => TODAY,
            ReadingDate::On(date) => date,
        }
    }

    /// Concrete `YYYY-MM-DD`, with `today` taken from `today`.
    pub fn resolve(&self, today: NaiveDate) -> String {
        match self {
            ReadingDate::Today => today.format("%Y-%m-%d").to_string(),
            ReadingDate::On(date) => date.clone(),
        }
    }

    /// Concrete date, with `today` taken from the local clock now.
    pub fn resolve_local(&self) -> String {
        self.resolve(Local::now().date_naive())
    }
}

//
// ================= Request =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generic,
    Personalized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoroscopeRequest {
    Generic {
        sign: &'static ZodiacSign,
        date: ReadingDate,
    },
    Personalized {
        birth: BirthDetails,
        date: ReadingDate,
    },
}

impl HoroscopeRequest {
    pub fn generic(sign: Option<&str>, date: Option<&str>) -> Result<Self> {
        let token = sign.unwrap_or_default();
        let sign = get_sign(token).ok_or_else(|| {
            ProxyError::InvalidInput(format!(
                "Invalid sign: \"{}\". Must be one of the 12 zodiac signs.",
                token.to_lowercase()
            ))
        })?;

        Ok(HoroscopeRequest::Generic {
            sign,
            date: ReadingDate::parse(date)?,
        })
    }

    pub fn personalized(birth: BirthDetails, date: Option<&str>) -> Result<Self> {
        Ok(HoroscopeRequest::Personalized {
            birth,
            date: ReadingDate::parse(date)?,
        })
    }

    /// Birth details win over a sign when both are supplied.
    pub fn from_params(
        sign: Option<&str>,
        birth: Option<BirthDetails>,
        date: Option<&str>,
    ) -> Result<Self> {
        match birth {
            Some(birth) => Self::personalized(birth, date),
            None => Self::generic(sign, date),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            HoroscopeRequest::Generic { .. } => Mode::Generic,
            HoroscopeRequest::Personalized { .. } => Mode::Personalized,
        }
    }

    pub fn date(&self) -> &ReadingDate {
        match self {
            HoroscopeRequest::Generic { date, .. } | HoroscopeRequest::Personalized { date, .. } => {
                date
            }
        }
    }
}

/// Build birth details from form-style fields (`YYYY-MM-DD`, `HH:MM`).
pub fn parse_birth_form(
    date: &str,
    time: &str,
    lat: f64,
    lng: f64,
    city: Option<&str>,
) -> Result<BirthDetails> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ProxyError::InvalidInput(format!("Invalid birth date: \"{}\". Use YYYY-MM-DD.", date))
    })?;
    let clock = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
        ProxyError::InvalidInput(format!("Invalid birth time: \"{}\". Use HH:MM.", time))
    })?;

    Ok(BirthDetails {
        year: day.year(),
        month: day.month(),
        day: day.day(),
        hour: clock.hour(),
        minute: clock.minute(),
        latitude: lat,
        longitude: lng,
        city: city
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNKNOWN_CITY)
            .to_string(),
    })
}

//
// ================= Dispatcher =================
//

/// A reading that passed the contract check.
///
/// `document` is the `{meta, data}` pair exactly as the upstream sent it and
/// is what goes back over the wire; `response` is the typed view of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub response: HoroscopeApiResponse,
    pub document: Value,
}

pub struct Dispatcher {
    upstream: Arc<dyn Upstream>,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Issue the single upstream call for `request` and validate the reply.
    ///
    /// No retries; a failed call is reported and the caller decides.
    pub async fn dispatch(&self, request: &HoroscopeRequest) -> Result<Reading> {
        let reply = match request {
            HoroscopeRequest::Generic { sign, date } => {
                info!(sign = sign.slug, date = date.as_str(), "Requesting sign horoscope");
                self.upstream.daily_sign(sign.slug, date.as_str()).await
            }
            HoroscopeRequest::Personalized { birth, date } => {
                let payload = PersonalHoroscopePayload {
                    birth: birth.clone(),
                    date: date.resolve_local(),
                };
                info!(
                    city = %payload.birth.city,
                    date = %payload.date,
                    "Requesting personalized horoscope"
                );
                self.upstream.daily_personal(&payload).await
            }
        };

        let body = reply.map_err(|e| {
            error!(mode = ?request.mode(), error = %e, "Astrology API call failed");
            e
        })?;

        decode_and_validate(&body)
    }
}

fn decode_and_validate(body: &str) -> Result<Reading> {
    let mut raw: Value = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "Astrology API returned a non-JSON body");
        ProxyError::ContractViolation(vec![SchemaIssue {
            path: String::new(),
            reason: format!("body is not valid JSON: {}", e),
        }])
    })?;

    match validate_response(&raw) {
        Validation::Valid(response) => {
            let mut take = |key: &str| raw.get_mut(key).map(Value::take).unwrap_or(Value::Null);
            let document = json!({ "meta": take("meta"), "data": take("data") });
            Ok(Reading {
                response: *response,
                document,
            })
        }
        Validation::Invalid(issues) => {
            for issue in &issues {
                warn!(%issue, "Schema issue");
            }
            error!(
                issue_count = issues.len(),
                "Astrology API response failed schema validation"
            );
            Err(ProxyError::ContractViolation(issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{sample_response, MockReply, MockUpstream};
    use tokio_test::{assert_err, assert_ok};

    fn new_york() -> BirthDetails {
        BirthDetails {
            year: 1990,
            month: 5,
            day: 14,
            hour: 8,
            minute: 30,
            latitude: 40.7,
            longitude: -74.0,
            city: "New York".to_string(),
        }
    }

    #[test]
    fn test_reading_date_parse() {
        assert_eq!(ReadingDate::parse(None).unwrap(), ReadingDate::Today);
        assert_eq!(ReadingDate::parse(Some("")).unwrap(), ReadingDate::Today);
        assert_eq!(ReadingDate::parse(Some("today")).unwrap(), ReadingDate::Today);
        assert_eq!(
            ReadingDate::parse(Some("2026-10-16")).unwrap(),
            ReadingDate::On("2026-10-16".into())
        );

        let rejected = vec![
            "Today",
            "tomorrow",
            "2026-1-16",
            "26-10-16",
            "2026/10/16",
            "2026-10-16T00:00",
            " 2026-10-16",
            "2026-10-16\n",
            "２０２６-10-16",
            "٢٠٢٦-10-16",
        ];
        for raw in rejected {
            let err = ReadingDate::parse(Some(raw)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{:?}", raw);
        }
    }

    #[test]
    fn test_reading_date_resolve() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(ReadingDate::Today.resolve(today), "2026-03-07");
        assert_eq!(ReadingDate::On("2025-12-31".into()).resolve(today), "2025-12-31");
    }

    #[test]
    fn test_mode_selection() {
        let generic = HoroscopeRequest::from_params(Some("Leo"), None, None).unwrap();
        assert_eq!(generic.mode(), Mode::Generic);

        // Birth details select personalized mode even with a sign present.
        let personal =
            HoroscopeRequest::from_params(Some("leo"), Some(new_york()), Some("today")).unwrap();
        assert_eq!(personal.mode(), Mode::Personalized);

        assert_err!(HoroscopeRequest::from_params(None, None, None));
        assert_err!(HoroscopeRequest::from_params(Some("ophiuchus"), None, None));
        assert_err!(HoroscopeRequest::from_params(None, Some(new_york()), Some("soon")));
    }

    #[test]
    fn test_parse_birth_form() {
        let birth = parse_birth_form("1990-05-14", "08:30", 40.7, -74.0, Some("New York")).unwrap();
        assert_eq!(birth, new_york());

        let unnamed = parse_birth_form("1990-05-14", "23:59", 0.0, 0.0, None).unwrap();
        assert_eq!(unnamed.city, "Unknown");
        assert_eq!((unnamed.hour, unnamed.minute), (23, 59));

        assert_err!(parse_birth_form("1990-02-30", "08:30", 0.0, 0.0, None));
        assert_err!(parse_birth_form("1990-05-14", "8h30", 0.0, 0.0, None));
        assert_err!(parse_birth_form("1990-05-14", "24:00", 0.0, 0.0, None));
    }

    #[tokio::test]
    async fn test_generic_dispatch_lowercases_sign() {
        let upstream = Arc::new(MockUpstream::with_json(&sample_response()));
        let dispatcher = Dispatcher::new(upstream.clone());

        let request = HoroscopeRequest::generic(Some("SCORPIO"), None).unwrap();
        let reading = assert_ok!(dispatcher.dispatch(&request).await);

        assert_eq!(reading.response.data.sign, "aries");
        assert_eq!(
            upstream.sign_requests.lock().unwrap().as_slice(),
            [("scorpio".to_string(), "today".to_string())]
        );
    }

    #[tokio::test]
    async fn test_personal_payload_round_trip() {
        let upstream = Arc::new(MockUpstream::with_json(&sample_response()));
        let dispatcher = Dispatcher::new(upstream.clone());

        let request = HoroscopeRequest::personalized(new_york(), Some("today")).unwrap();
        assert_ok!(dispatcher.dispatch(&request).await);

        let sent = upstream.personal_requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let body = serde_json::to_value(&sent[0]).unwrap();

        assert_eq!(body["birth"]["year"], 1990);
        assert_eq!(body["birth"]["month"], 5);
        assert_eq!(body["birth"]["day"], 14);
        assert_eq!(body["birth"]["hour"], 8);
        assert_eq!(body["birth"]["minute"], 30);
        assert_eq!(body["birth"]["latitude"], 40.7);
        assert_eq!(body["birth"]["longitude"], -74.0);
        assert_eq!(body["birth"]["city"], "New York");
        assert_eq!(body["date"], Local::now().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_error_taxonomy() {
        let request = HoroscopeRequest::generic(Some("leo"), Some("2026-10-16")).unwrap();

        let cases = vec![
            (MockReply::Unreachable, ErrorKind::NetworkError),
            (MockReply::Status(500, "boom".into()), ErrorKind::UpstreamError),
            (MockReply::Body("<html>oops</html>".into()), ErrorKind::ContractViolation),
            (MockReply::Body(r#"{"meta": {}, "data": {}}"#.into()), ErrorKind::ContractViolation),
        ];

        for (reply, kind) in cases {
            let dispatcher = Dispatcher::new(Arc::new(MockUpstream::replying(reply)));
            let err = dispatcher.dispatch(&request).await.unwrap_err();
            assert_eq!(err.kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_generic_dispatch_is_idempotent() {
        let dispatcher = Dispatcher::new(Arc::new(MockUpstream::with_json(&sample_response())));
        let request = HoroscopeRequest::generic(Some("aries"), Some("2026-10-16")).unwrap();

        let first = dispatcher.dispatch(&request).await.unwrap();
        let second = dispatcher.dispatch(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_document_keeps_upstream_content() {
        let mut upstream_doc = sample_response();
        upstream_doc["data"]["content"]["mood"] = json!("calm");
        upstream_doc["trace"] = json!("internal");
        let dispatcher = Dispatcher::new(Arc::new(MockUpstream::with_json(&upstream_doc)));
        let request = HoroscopeRequest::generic(Some("aries"), None).unwrap();

        let reading = dispatcher.dispatch(&request).await.unwrap();

        assert_eq!(reading.document["meta"], upstream_doc["meta"]);
        assert_eq!(reading.document["data"], upstream_doc["data"]);
        assert!(reading.document["data"]["lucky"]["number"].is_u64());
        assert!(reading.document.get("trace").is_none());
    }
}
