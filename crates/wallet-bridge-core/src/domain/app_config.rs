//! The application config stored by the backend and its merge rules.
//!
//! The backend persists one object with two sections:
//!
//! ```json
//! {"backend": {"proxy": {...}, "btcActive": true}, "frontend": {"fiatCode": "CHF"}}
//! ```
//!
//! The `config` endpoint only supports whole-object replacement, so a partial
//! update is a read, a merge, and a write.  [`AppConfig::merge`] is that merge:
//! patch keys overwrite section keys one level deep, everything else is kept.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One section of the config (`backend` or `frontend`).
pub type Section = Map<String, Value>;

/// The full application config as returned by `GET config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub backend: Section,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frontend: Section,
    /// Top-level keys this client does not model, written back untouched.
    #[serde(flatten)]
    pub extra: Section,
}

// A fresh backend reports `"frontend": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Section, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Section>::deserialize(deserializer)?.unwrap_or_default())
}

impl AppConfig {
    /// Overlays `patch` onto `self`, one section level deep.
    ///
    /// For each section present in the patch, every key of the patch section
    /// replaces the key of the same name.  Nested objects are replaced whole,
    /// not merged recursively.
    pub fn merge(&mut self, patch: &ConfigPatch) {
        if let Some(backend) = &patch.backend {
            overlay(&mut self.backend, backend);
        }
        if let Some(frontend) = &patch.frontend {
            overlay(&mut self.frontend, frontend);
        }
    }

    /// Returns a copy of `self` with `patch` applied.
    pub fn merged(mut self, patch: &ConfigPatch) -> Self {
        self.merge(patch);
        self
    }

    /// Looks up `key` in the named section (`"backend"` or `"frontend"`).
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        match section {
            "backend" => self.backend.get(key),
            "frontend" => self.frontend.get(key),
            _ => None,
        }
    }
}

fn overlay(target: &mut Section, patch: &Section) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

/// A partial config update: only the keys to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<Section>,
}

impl ConfigPatch {
    /// A patch touching only the `frontend` section.
    pub fn frontend(section: Section) -> Self {
        Self {
            backend: None,
            frontend: Some(section),
        }
    }

    /// A patch touching only the `backend` section.
    pub fn backend(section: Section) -> Self {
        Self {
            backend: Some(section),
            frontend: None,
        }
    }

    /// Adds `key = value` to the named section.  Unknown section names are
    /// rejected by returning `false`.
    pub fn set(&mut self, section: &str, key: impl Into<String>, value: Value) -> bool {
        let target = match section {
            "backend" => self.backend.get_or_insert_with(Section::new),
            "frontend" => self.frontend.get_or_insert_with(Section::new),
            _ => return false,
        };
        target.insert(key.into(), value);
        true
    }

    /// Folds a later patch into this one.  Keys in `later` win.
    pub fn absorb(&mut self, later: ConfigPatch) {
        if let Some(backend) = later.backend {
            overlay(self.backend.get_or_insert_with(Section::new), &backend);
        }
        if let Some(frontend) = later.frontend {
            overlay(self.frontend.get_or_insert_with(Section::new), &frontend);
        }
    }

    /// Returns `true` when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.backend.as_ref().map_or(true, Map::is_empty)
            && self.frontend.as_ref().map_or(true, Map::is_empty)
    }
}
