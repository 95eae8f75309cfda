use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;
use tracing::{debug, warn};

use crate::domain::PageSize;
use crate::infra::uex::DEFAULT_BASE_URL;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "SetScallywag";
const APP_NAME: &str = "UexTrader";
const SETTINGS_FILE: &str = "settings.json";

/// User settings. Keys are stored base64-encoded so they are not readable at a glance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(with = "obfuscated")]
    pub api_key: Option<String>,
    #[serde(with = "obfuscated")]
    pub secret_key: Option<String>,
    pub base_url: String,
    pub cache_ttl_secs: u64,
    pub debug: bool,
    pub page_size: PageSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl_secs: 300,
            debug: false,
            page_size: PageSize::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

impl Settings {
    pub const KEYS: [&'static str; 6] = [
        "api_key",
        "secret_key",
        "base_url",
        "cache_ttl_secs",
        "debug",
        "page_size",
    ];

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Self::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to read settings, using defaults");
                return Self::default();
            }
        };

        serde_json::from_str(&data).unwrap_or_else(|error| {
            warn!(path = %path.display(), %error, "Corrupt settings file, using defaults");
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Update one setting from its textual form. Empty values clear keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match key {
            "api_key" => self.api_key = non_empty(value),
            "secret_key" => self.secret_key = non_empty(value),
            "base_url" => {
                url::Url::parse(value).map_err(|_| invalid())?;
                self.base_url = value.to_string();
            }
            "cache_ttl_secs" => self.cache_ttl_secs = value.parse().map_err(|_| invalid())?,
            "debug" => self.debug = value.parse().map_err(|_| invalid())?,
            "page_size" => {
                let size: usize = value.parse().map_err(|_| invalid())?;
                self.page_size = PageSize::try_from(size).map_err(|_| invalid())?;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Key/value pairs for display, with credentials masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", mask(self.api_key.as_deref())),
            ("secret_key", mask(self.secret_key.as_deref())),
            ("base_url", self.base_url.clone()),
            ("cache_ttl_secs", self.cache_ttl_secs.to_string()),
            ("debug", self.debug.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn mask(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "(not set)".to_string();
    };
    let count = value.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("****{tail}")
}

pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

pub fn load_settings() -> Settings {
    match settings_path() {
        Some(path) => Settings::load_from(&path),
        None => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<(), SettingsError> {
    let path = settings_path().ok_or(SettingsError::StorageUnavailable)?;
    settings.save_to(&path)
}

mod obfuscated {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&STANDARD.encode(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(encoded) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if encoded.is_empty() {
            return Ok(None);
        }
        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        String::from_utf8(bytes).map(Some).map_err(D::Error::custom)
    }
}
