//! Last-input convenience store
//!
//! Keeps the most recently submitted birth form on disk so it can be
//! prefilled next time. Advisory only: an unreadable or corrupt file is
//! logged and treated as empty.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::GeoResult;
use crate::Result;

/// Default form time when nothing was saved
pub const DEFAULT_BIRTH_TIME: &str = "12:00";

/// Snapshot of the birth form as the user last submitted it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedBirthDetails {
    pub date: String,
    pub time: String,
    pub city: Option<GeoResult>,
}

impl Default for SavedBirthDetails {
    fn default() -> Self {
        Self {
            date: String::new(),
            time: DEFAULT_BIRTH_TIME.to_string(),
            city: None,
        }
    }
}

pub struct LastInputStore {
    path: PathBuf,
}

impl LastInputStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Option<SavedBirthDetails> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read saved birth details");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse birth details");
                None
            }
        }
    }

    pub async fn save(&self, details: &SavedBirthDetails) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(details)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved() -> SavedBirthDetails {
        SavedBirthDetails {
            date: "1990-05-14".into(),
            time: "08:30".into(),
            city: Some(GeoResult {
                name: "New York".into(),
                country: "US".into(),
                lat: 40.7,
                lng: -74.0,
                timezone: "America/New_York".into(),
            }),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastInputStore::new(dir.path().join("birth_details.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_saved_form_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastInputStore::new(dir.path().join("nested").join("birth_details.json"));

        store.save(&saved()).await.unwrap();
        assert_eq!(store.load().await, Some(saved()));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birth_details.json");
        tokio::fs::write(&path, "{\"date\": \"1990-05-14\", \"time\":").await.unwrap();

        let store = LastInputStore::new(&path);
        assert!(store.load().await.is_none());

        // The next submit simply overwrites it.
        store.save(&saved()).await.unwrap();
        assert_eq!(store.load().await, Some(saved()));
    }
}
