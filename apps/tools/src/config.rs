use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use command_core::CommandServiceOptions;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "command-tool.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub dev_mode: bool,
    pub schedule_delay_ms: u64,
    pub log_filter: String,
    pub settings_file: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            dev_mode: false,
            schedule_delay_ms: 10,
            log_filter: "info".into(),
            settings_file: None,
        }
    }
}

impl ToolSettings {
    pub fn service_options(&self) -> CommandServiceOptions {
        CommandServiceOptions {
            dev_mode: self.dev_mode,
            schedule_delay: Duration::from_millis(self.schedule_delay_ms),
        }
    }
}

/// Reads `command-tool.toml` from the working directory (or `explicit`, which must exist),
/// then applies `APP__*` environment overrides.
pub fn load_settings(explicit: Option<&Path>) -> Result<ToolSettings> {
    load_settings_from(explicit, app_environment())
}

fn app_environment() -> Environment {
    Environment::with_prefix("APP")
        .separator("__")
        .try_parsing(true)
}

fn load_settings_from(explicit: Option<&Path>, environment: Environment) -> Result<ToolSettings> {
    let file = match explicit {
        Some(path) => File::from(path.to_path_buf()).required(true),
        None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
    };
    let raw = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()
        .context("failed to load command-tool configuration")?;
    raw.try_deserialize()
        .context("invalid command-tool configuration")
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        app_environment().source(Some(vars))
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp config");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_apply_without_file_or_environment() {
        let settings = load_settings_from(None, environment(&[])).expect("load");
        assert_eq!(settings, ToolSettings::default());
        assert_eq!(
            settings.service_options().schedule_delay,
            Duration::from_millis(10)
        );
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = config_file("dev_mode = false\nschedule_delay_ms = 50\nlog_filter = \"debug\"\n");
        let settings = load_settings_from(
            Some(file.path()),
            environment(&[("APP__DEV_MODE", "true"), ("APP__SCHEDULE_DELAY_MS", "5")]),
        )
        .expect("load");

        assert!(settings.dev_mode);
        assert_eq!(settings.schedule_delay_ms, 5);
        assert_eq!(settings.log_filter, "debug");
        assert!(settings.service_options().dev_mode);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let missing = Path::new("definitely-missing-command-tool.toml");
        assert!(load_settings_from(Some(missing), environment(&[])).is_err());
    }
}
