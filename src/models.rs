//! Core data models for the horoscope proxy
//!
//! The upstream contract types are only ever built from a document that
//! already passed `schema::validate_response`.

use serde::{Deserialize, Serialize};

//
// ================= Shared =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyLabel {
    pub key: String,
    pub label: String,
}

//
// ================= Horoscope Data =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
    pub love: f64,
    pub career: f64,
    pub money: f64,
    pub health: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFactor {
    pub dimension: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeLucky {
    pub color: KeyLabel,
    pub number: f64,
    pub time_window: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeContent {
    pub text: String,
    pub theme: String,
    pub keywords: Vec<String>,
    #[serde(rename = "do", default, skip_serializing_if = "Option::is_none")]
    pub dos: Option<Vec<String>>,
    #[serde(rename = "dont", default, skip_serializing_if = "Option::is_none")]
    pub donts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_insights: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Highlight {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeAstro {
    pub moon_sign: KeyLabel,
    pub moon_phase: KeyLabel,
    pub highlights: Vec<Highlight>,
}

/// A transit explanation arrives either as plain text or structured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TransitExplanation {
    Text(String),
    Structured {
        main: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        supporting: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tags: Option<Vec<String>>,
    },
}

impl TransitExplanation {
    pub fn main(&self) -> &str {
        match self {
            TransitExplanation::Text(text) => text,
            TransitExplanation::Structured { main, .. } => main,
        }
    }

    pub fn supporting(&self) -> &[String] {
        match self {
            TransitExplanation::Structured {
                supporting: Some(points),
                ..
            } => points.as_slice(),
            _ => &[],
        }
    }
}

/// Transits scoring above this are flagged as significant
pub const SIGNIFICANT_TRANSIT_SCORE: f64 = 80.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transit {
    pub transit_planet: KeyLabel,
    pub natal_planet: KeyLabel,
    pub aspect: KeyLabel,
    pub orb_deg: f64,
    pub score: f64,
    pub explanation: TransitExplanation,
    pub is_applying: bool,
    pub exact_at: Option<String>,
}

impl Transit {
    pub fn is_significant(&self) -> bool {
        self.score > SIGNIFICANT_TRANSIT_SCORE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalReading {
    pub transits_top: Vec<Transit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_areas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeData {
    pub sign: String,
    pub date: String,
    pub scores: HoroscopeScores,
    pub score_factors: Vec<ScoreFactor>,
    pub lucky: HoroscopeLucky,
    pub content: HoroscopeContent,
    pub astro: HoroscopeAstro,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalReading>,
}

impl HoroscopeData {
    /// Reason given for a score dimension, if the upstream sent one.
    pub fn factor_for(&self, dimension: &str) -> Option<&str> {
        self.score_factors
            .iter()
            .find(|f| f.dimension == dimension)
            .map(|f| f.reason.as_str())
    }
}

//
// ================= Envelope =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub locale: String,
    pub date_resolved: String,
    pub orb_policy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheInfo {
    pub hit: bool,
    pub ttl_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeMeta {
    pub request_id: String,
    pub generated_at: String,
    pub settings: HoroscopeSettings,
    pub cache: CacheInfo,
    pub engine: EngineInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoroscopeApiResponse {
    pub meta: HoroscopeMeta,
    pub data: HoroscopeData,
}

//
// ================= Birth Details =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BirthDetails {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
}

impl BirthDetails {
    /// `YYYY-MM-DD`, zero padded
    pub fn date_string(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// `HH:MM`, zero padded
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

//
// ================= Upstream Payloads =================
//

/// Body of the upstream personal horoscope POST
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalHoroscopePayload {
    pub birth: BirthDetails,
    pub date: String,
}

//
// ================= Geo =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoResult {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub timezone: String,
}
