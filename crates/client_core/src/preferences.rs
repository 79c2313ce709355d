use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const APP_DIR: &str = "workorders";
const FILE_NAME: &str = "preferences.json";

/// View options for the work order list. Values are not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub view_mode: String,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_order: String,
    pub show_completed: bool,
    pub show_archived: bool,
    /// Keys this version does not know about, carried through load and save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            view_mode: "list".into(),
            page_size: 10,
            sort_by: "dueDate".into(),
            sort_order: "asc".into(),
            show_completed: true,
            show_archived: false,
            extra: Map::new(),
        }
    }
}

impl Preferences {
    pub fn is_descending(&self) -> bool {
        self.sort_order.eq_ignore_ascii_case("desc")
    }

    /// Reads one field by its wire key.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut record)) => record.remove(key),
            _ => None,
        }
    }

    /// Sets one field by its wire key. `raw` is taken as JSON when it parses
    /// (`20`, `false`) and as a plain string otherwise (`grid`).
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<()> {
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.set_value(key, value)
            .with_context(|| format!("invalid value '{raw}' for preference '{key}'"))
    }

    /// Sets one key; on a type mismatch `self` is left as it was.
    fn set_value(&mut self, key: &str, value: Value) -> Result<()> {
        let Value::Object(mut record) = serde_json::to_value(&*self)? else {
            return Err(anyhow!("preferences did not serialize to an object"));
        };
        record.insert(key.to_string(), value);
        *self = serde_json::from_value(Value::Object(record))?;
        Ok(())
    }

    /// Lays a persisted record over the defaults one key at a time. A key
    /// whose value has the wrong type keeps its default; the rest still apply.
    fn merged_over_defaults(record: Map<String, Value>) -> Self {
        let mut preferences = Self::default();
        for (key, value) in record {
            if let Err(error) = preferences.set_value(&key, value) {
                warn!(%key, %error, "ignoring saved preference with unexpected type");
            }
        }
        preferences
    }
}

/// Preferences bound to the file they persist to.
///
/// Loading never fails: a missing file yields the defaults, an unreadable or
/// corrupt one is logged and replaced by the defaults, and a single bad key
/// only costs that key. Every mutation rewrites the whole file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    preferences: Preferences,
}

impl PreferenceStore {
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no configuration directory for this platform")?;
        Ok(base.join(APP_DIR).join(FILE_NAME))
    }

    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(record)) => Preferences::merged_over_defaults(record),
                Ok(other) => {
                    warn!(path = %path.display(), found = %other, "preferences are not a JSON object");
                    Preferences::default()
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "ignoring corrupt preferences");
                    Preferences::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved preferences, using defaults");
                Preferences::default()
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read preferences");
                Preferences::default()
            }
        };
        Self { path, preferences }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn update(&mut self, f: impl FnOnce(&mut Preferences)) -> Result<()> {
        f(&mut self.preferences);
        self.save()
    }

    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        self.preferences.set_field(key, raw)?;
        self.save()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.preferences = Preferences::default();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.preferences)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
