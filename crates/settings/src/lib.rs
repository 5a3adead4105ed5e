//! Key/value settings store consumed by commands.
//!
//! The store is the source of truth at read time. Writes are applied immediately; how a real
//! host persists them is outside this crate.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub trait SettingsStore: Send + Sync {
    fn value(&self, key: &str) -> Option<Value>;

    fn set_value(&self, key: &str, value: Value) -> Result<()>;

    /// Allowed values of an enumerated setting, in declaration order.
    fn enum_option_values(&self, key: &str) -> Vec<String>;

    fn bool_value(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(|value| value.as_bool())
    }

    fn string_value(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingWrite {
    pub key: String,
    pub value: Value,
}

#[derive(Default)]
struct MemoryState {
    values: HashMap<String, Value>,
    enum_options: HashMap<String, Vec<String>>,
    writes: Vec<SettingWrite>,
}

/// In-memory settings with a journal of every `set_value` call.
#[derive(Default)]
pub struct MemorySettings {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    values: BTreeMap<String, toml::Value>,
    #[serde(default)]
    enum_options: BTreeMap<String, Vec<String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from a TOML document with optional `[values]` and `[enum_options]` tables.
    /// Seeding does not count as a write.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(raw).context("invalid settings toml")?;
        let settings = Self::new();
        {
            let mut state = settings.state.write();
            for (key, value) in file.values {
                let value = serde_json::to_value(value)
                    .with_context(|| format!("setting '{key}' is not representable as json"))?;
                state.values.insert(key, value);
            }
            state.enum_options.extend(file.enum_options);
        }
        Ok(settings)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed to load settings file '{}'", path.display()))
    }

    pub fn define_enum<I, S>(&self, key: &str, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .write()
            .enum_options
            .insert(key.to_string(), options.into_iter().map(Into::into).collect());
    }

    /// Sets a value without recording a write, for fixtures and defaults.
    pub fn seed(&self, key: &str, value: impl Into<Value>) {
        self.state.write().values.insert(key.to_string(), value.into());
    }

    pub fn writes(&self) -> Vec<SettingWrite> {
        self.state.read().writes.clone()
    }

    pub fn writes_for(&self, key: &str) -> Vec<Value> {
        self.state
            .read()
            .writes
            .iter()
            .filter(|write| write.key == key)
            .map(|write| write.value.clone())
            .collect()
    }

    pub fn clear_writes(&self) {
        self.state.write().writes.clear();
    }
}

impl SettingsStore for MemorySettings {
    fn value(&self, key: &str) -> Option<Value> {
        self.state.read().values.get(key).cloned()
    }

    fn set_value(&self, key: &str, value: Value) -> Result<()> {
        debug!(key, %value, "settings: set value");
        let mut state = self.state.write();
        state.writes.push(SettingWrite {
            key: key.to_string(),
            value: value.clone(),
        });
        state.values.insert(key.to_string(), value);
        Ok(())
    }

    fn enum_option_values(&self, key: &str) -> Vec<String> {
        self.state
            .read()
            .enum_options
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn set_value_is_journaled_and_readable() {
        let settings = MemorySettings::new();
        settings.seed("notes.sortOrder.reverse", false);
        assert!(settings.writes().is_empty());

        settings
            .set_value("notes.sortOrder.reverse", json!(true))
            .expect("set");
        assert_eq!(settings.bool_value("notes.sortOrder.reverse"), Some(true));
        assert_eq!(
            settings.writes(),
            vec![SettingWrite {
                key: "notes.sortOrder.reverse".into(),
                value: json!(true),
            }]
        );
        assert_eq!(
            settings.writes_for("notes.sortOrder.reverse"),
            vec![json!(true)]
        );

        settings.clear_writes();
        assert!(settings.writes().is_empty());
    }

    #[test]
    fn typed_helpers_reject_mismatched_types() {
        let settings = MemorySettings::new();
        settings.seed("a", "text");
        settings.seed("b", 1);
        assert_eq!(settings.string_value("a").as_deref(), Some("text"));
        assert_eq!(settings.bool_value("a"), None);
        assert_eq!(settings.string_value("b"), None);
        assert_eq!(settings.string_value("missing"), None);
    }

    #[test]
    fn enum_options_keep_declaration_order() {
        let settings = MemorySettings::new();
        settings.define_enum("field", ["title", "order", "user_created_time"]);
        assert_eq!(
            settings.enum_option_values("field"),
            vec!["title", "order", "user_created_time"]
        );
        assert!(settings.enum_option_values("other").is_empty());
    }

    #[test]
    fn loads_values_and_enum_options_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[values]
"notes.sortOrder.field" = "title"
"notes.sortOrder.reverse" = true
"notes.perFieldReverse" = {{ title = true }}

[enum_options]
"notes.sortOrder.field" = ["user_updated_time", "title", "order"]
"#
        )
        .expect("write");

        let settings = MemorySettings::from_toml_file(file.path()).expect("load");
        assert_eq!(
            settings.string_value("notes.sortOrder.field").as_deref(),
            Some("title")
        );
        assert_eq!(settings.bool_value("notes.sortOrder.reverse"), Some(true));
        assert_eq!(
            settings.value("notes.perFieldReverse"),
            Some(json!({ "title": true }))
        );
        assert_eq!(settings.enum_option_values("notes.sortOrder.field").len(), 3);
        assert!(settings.writes().is_empty());
    }

    #[test]
    fn malformed_toml_is_reported_with_context() {
        let err = MemorySettings::from_toml_str("values = 3").err().expect("error");
        assert!(err.to_string().contains("invalid settings toml"));
    }
}
