//! Horoscope Proxy
//!
//! A thin, validating proxy in front of a third-party astrology API:
//! - Checks caller input (sign, dates, birth details) before going upstream
//! - Issues one upstream call per request, generic or personalized
//! - Accepts upstream replies only if they fully match the declared contract
//! - Never leaks raw upstream errors to end users
//!
//! FLOW:
//! CALLER → DISPATCH → UPSTREAM → VALIDATE → RESPOND

pub mod api;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod geo;
pub mod models;
pub mod render;
pub mod schema;
pub mod signs;
pub mod store;
pub mod upstream;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ProxyError, Result};

// Re-export common types
pub use models::*;
pub use dispatcher::{Dispatcher, HoroscopeRequest, Reading, ReadingDate};
pub use signs::{get_sign, is_valid_sign, ZodiacSign, ZODIAC_SIGNS};
