//! Durable client preference storage
//!
//! Holds the two persisted client values: the bearer token and the theme
//! preference. Backed by a small JSON file at a configured path, standing in
//! for the browser-local storage the admin client uses.

use crate::error::AuthResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key for the theme preference
pub const THEME_KEY: &str = "theme";

/// Theme preference consumed by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a stored preference value; unknown values fall back to light
    pub fn parse(value: &str) -> Theme {
        match value {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// File-backed key-value preference store
#[derive(Debug, Clone)]
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a stored value; absent file or absent key yields `None`
    pub fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    /// Write a value, creating the store file if needed
    pub fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut map = self.load();
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    /// Remove a key if present
    pub fn remove(&self, key: &str) -> AuthResult<()> {
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    /// Stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) -> AuthResult<()> {
        self.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> AuthResult<()> {
        self.remove(TOKEN_KEY)
    }

    /// Stored theme preference, defaulting to light
    pub fn theme(&self) -> Theme {
        self.get(THEME_KEY)
            .map(|v| Theme::parse(&v))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> AuthResult<()> {
        self.set(THEME_KEY, theme.as_str())
    }

    // An unreadable or corrupt store is treated as empty rather than
    // failing reads; the session degrades to unauthenticated.
    fn load(&self) -> BTreeMap<String, String> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!("preference store at {:?} is corrupt: {}", self.path, e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        }
    }

    fn save(&self, map: &BTreeMap<String, String>) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_store() -> (tempfile::TempDir, PrefStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PrefStore::new(dir.path().join("prefs.json"));
        (dir, store)
    }

    #[test]
    fn absent_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("anything"), None);
        assert_eq!(store.token(), None);
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn token_round_trip_and_clear() {
        let (_dir, store) = temp_store();
        store.set_token("abc.def.ghi").unwrap();
        assert_eq!(store.token(), Some("abc.def.ghi".to_string()));
        store.clear_token().unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn empty_token_reads_as_absent() {
        let (_dir, store) = temp_store();
        store.set(TOKEN_KEY, "").unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn theme_round_trip() {
        let (_dir, store) = temp_store();
        store.set_theme(Theme::Dark).unwrap();
        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY), Some("dark".to_string()));
    }

    #[test]
    fn unknown_theme_value_falls_back_to_light() {
        let (_dir, store) = temp_store();
        store.set(THEME_KEY, "solarized").unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn corrupt_store_reads_as_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), b"{{{ not json").unwrap();
        assert_eq!(store.get("anything"), None);
        // Writes recover the store.
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[test]
    fn keys_are_independent() {
        let (_dir, store) = temp_store();
        store.set_token("tok").unwrap();
        store.set_theme(Theme::Dark).unwrap();
        store.clear_token().unwrap();
        assert_eq!(store.theme(), Theme::Dark);
    }
}
