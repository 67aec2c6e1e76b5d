use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "ticketdesk";
const CONFIG_FILE_NAME: &str = "config.json";

const DEFAULT_PREVIEW_RELEASE_SECS: u64 = 15;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_BASE_URL: &str = "TICKETDESK_BASE_URL";
const ENV_LOG_FORMAT: &str = "TICKETDESK_LOG_FORMAT";
const ENV_PREVIEW_RELEASE_SECS: &str = "TICKETDESK_PREVIEW_RELEASE_SECS";
const ENV_TIMEOUT_SECS: &str = "TICKETDESK_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub log_format: LogFormat,
    /// `None` turns the timed preview release off.
    pub preview_release_after: Option<Duration>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "plain" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(&stored, |key| env::var(key).ok())
    }

    /// Environment first, then the stored file, then defaults.
    pub fn resolve(
        stored: &StoredConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let pick = |key: &str, fallback: &Option<String>| {
            lookup(key)
                .or_else(|| fallback.clone())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_format = match pick(ENV_LOG_FORMAT, &stored.log_format) {
            Some(value) => LogFormat::from_str(&value).ok_or_else(|| {
                AppError::Configuration(format!("unknown log format '{value}'"))
            })?,
            None => LogFormat::Text,
        };

        let preview_secs = parse_secs(
            "preview release delay",
            pick(ENV_PREVIEW_RELEASE_SECS, &stored.preview_release_secs),
            DEFAULT_PREVIEW_RELEASE_SECS,
        )?;
        let timeout_secs = parse_secs(
            "request timeout",
            pick(ENV_TIMEOUT_SECS, &stored.timeout_secs),
            DEFAULT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            base_url: pick(ENV_BASE_URL, &stored.base_url),
            log_format,
            preview_release_after: (preview_secs > 0).then(|| Duration::from_secs(preview_secs)),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

fn parse_secs(label: &str, value: Option<String>, default: u64) -> AppResult<u64> {
    match value {
        Some(value) => value.parse::<u64>().map_err(|err| {
            AppError::Configuration(format!("invalid {label} '{value}': {err}"))
        }),
        None => Ok(default),
    }
}

/// Values persisted by `config init`. Numbers are kept as text so the wizard
/// can treat every field the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_release_secs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Configuration("no config directory on this platform".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_any_source() {
        let config = AppConfig::resolve(&StoredConfig::default(), env_of(&[])).expect("config");
        assert_eq!(config.base_url, None);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.preview_release_after, Some(Duration::from_secs(15)));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_stored_values() {
        let stored = StoredConfig {
            base_url: Some("http://stored.local".to_string()),
            log_format: Some("json".to_string()),
            preview_release_secs: Some("5".to_string()),
            timeout_secs: None,
        };
        let config = AppConfig::resolve(
            &stored,
            env_of(&[
                (ENV_BASE_URL, "http://env.local"),
                (ENV_PREVIEW_RELEASE_SECS, "0"),
            ]),
        )
        .expect("config");

        assert_eq!(config.base_url.as_deref(), Some("http://env.local"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.preview_release_after, None);
    }

    #[test]
    fn rejects_bad_values() {
        let result = AppConfig::resolve(
            &StoredConfig::default(),
            env_of(&[(ENV_TIMEOUT_SECS, "soon")]),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let result = AppConfig::resolve(
            &StoredConfig::default(),
            env_of(&[(ENV_LOG_FORMAT, "xml")]),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn stored_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        assert!(StoredConfig::load_from(&path).expect("missing file").base_url.is_none());

        let stored = StoredConfig {
            base_url: Some("https://desk.example".to_string()),
            ..StoredConfig::default()
        };
        stored.save_to(&path).expect("save");

        let loaded = StoredConfig::load_from(&path).expect("load");
        assert_eq!(loaded.base_url.as_deref(), Some("https://desk.example"));
        assert_eq!(loaded.timeout_secs, None);
    }

    #[test]
    fn corrupt_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            StoredConfig::load_from(&path),
            Err(AppError::Configuration(_))
        ));
    }
}
