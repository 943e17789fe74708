use chrono_tz::Tz;
use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "HUDDLE_CONFIG_PATH";

const DEFAULT_CONTACTS_FILE: &str = "contacts.json";

/// Errors raised while resolving configuration or credentials
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unknown time zone '{0}'")]
    UnknownTimeZone(String),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Invalid credential file {path}: {reason}")]
    InvalidCredential { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default)]
    pub language_model: LanguageModelConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContactsConfig {
    /// Contacts document; relative paths are resolved against the config directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanguageModelConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LanguageModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarConfig {
    pub api_base: String,
    pub calendar_id: String,
    /// IANA zone attached to times that carry no offset
    pub time_zone: String,
    pub upcoming_count: u32,
    /// Google `sendUpdates` value used on insert
    pub send_updates: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            calendar_id: "primary".to_string(),
            time_zone: "UTC".to_string(),
            upcoming_count: 10,
            send_updates: "all".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Load from an explicit path, writing defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {:?}, writing defaults", path);
            let default_config = Config::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Config = toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        debug!("Loaded config from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Where the contacts document lives for a config loaded from `config_path`
    pub fn contacts_path(&self, config_path: &Path) -> PathBuf {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.contacts.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(DEFAULT_CONTACTS_FILE),
        }
    }

    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.calendar
            .time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.calendar.time_zone.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = env::var(CONFIG_PATH_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let proj_dirs =
        ProjectDirs::from("com", "huddle", "huddle").ok_or(ConfigError::NoConfigDir)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.calendar.time_zone, "UTC");
        assert_eq!(config.calendar.upcoming_count, 10);
        assert_eq!(config.language_model.model, "llama-3.3-70b-versatile");
        assert_eq!(config.time_zone().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_missing_config_writes_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, Config::default());
        assert!(path.exists());

        // Second load reads what was written
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[calendar]\ntime_zone = \"Europe/Berlin\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calendar.time_zone, "Europe/Berlin");
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.network.timeout_secs, 30);
        assert_eq!(config.time_zone().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[calendar\nnot toml").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_unknown_time_zone() {
        let mut config = Config::default();
        config.calendar.time_zone = "Mars/Olympus".to_string();
        assert!(matches!(config.time_zone(), Err(ConfigError::UnknownTimeZone(_))));
    }

    #[test]
    fn test_contacts_path_resolution() {
        let config_path = Path::new("/etc/huddle/config.toml");
        let mut config = Config::default();
        assert_eq!(config.contacts_path(config_path), PathBuf::from("/etc/huddle/contacts.json"));

        config.contacts.path = Some(PathBuf::from("people/team.json"));
        assert_eq!(
            config.contacts_path(config_path),
            PathBuf::from("/etc/huddle/people/team.json")
        );

        config.contacts.path = Some(PathBuf::from("/srv/contacts.json"));
        assert_eq!(config.contacts_path(config_path), PathBuf::from("/srv/contacts.json"));
    }
}
