//! Configuration management for friend-tracker.
//!
//! Handles:
//! - API endpoints and request headers
//! - Pagination and batching sizes
//! - Rate-limit retry counts and delays
//! - Corruption guard thresholds
//! - Storage locations for snapshots and the cookie file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::util::atomic_write;

/// Largest batch the bulk user-detail endpoint accepts.
pub const MAX_DETAIL_BATCH: usize = 50;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Friend-list pagination settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Bulk detail lookup settings.
    #[serde(default)]
    pub enrich: EnrichConfig,
    /// Corruption guard thresholds.
    #[serde(default)]
    pub guard: GuardConfig,
    /// Storage locations.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| TrackerError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TrackerError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.page_size == 0 {
            return Err(invalid("fetch.page_size must be greater than zero"));
        }
        if self.enrich.batch_size == 0 || self.enrich.batch_size > MAX_DETAIL_BATCH {
            return Err(invalid(format!(
                "enrich.batch_size must be between 1 and {MAX_DETAIL_BATCH}"
            )));
        }
        if self.enrich.max_retries == 0 {
            return Err(invalid("enrich.max_retries must be at least 1"));
        }
        for (key, value) in [
            ("guard.analysis_max_nameless", self.guard.analysis_max_nameless),
            ("guard.save_max_nameless", self.guard.save_max_nameless),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(format!("{key} must be in (0, 1], got {value}")));
            }
        }
        Ok(())
    }

    /// Directory holding per-account snapshot files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Path of the stored session cookie.
    pub fn cookie_file(&self) -> Result<PathBuf> {
        match &self.storage.cookie_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("cookie.txt")),
        }
    }
}

fn invalid(message: impl Into<String>) -> TrackerError {
    TrackerError::InvalidConfig {
        message: message.into(),
    }
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the users service (identity and bulk details).
    #[serde(default = "default_users_base_url")]
    pub users_base_url: String,
    /// Base URL of the friends service.
    #[serde(default = "default_friends_base_url")]
    pub friends_base_url: String,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            users_base_url: default_users_base_url(),
            friends_base_url: default_friends_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Friend-list pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Entries requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Pause before reissuing a rate-limited page request.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// How many consecutive 429s a single page may absorb before giving up.
    #[serde(default = "default_max_rate_limit_waits")]
    pub max_rate_limit_waits: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            max_rate_limit_waits: default_max_rate_limit_waits(),
        }
    }
}

impl FetchConfig {
    /// Rate-limit pause as a duration.
    #[must_use]
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

/// Bulk detail lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Identifiers sent per POST.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Attempts per batch, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay multiplied by the attempt number after a 429.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Pause after a connection error.
    #[serde(default = "default_connection_error_delay_ms")]
    pub connection_error_delay_ms: u64,
    /// Ask the API to omit banned accounts.
    #[serde(default)]
    pub exclude_banned_users: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_rate_limit_delay_ms(),
            connection_error_delay_ms: default_connection_error_delay_ms(),
            exclude_banned_users: false,
        }
    }
}

/// Corruption guard thresholds, as fractions of records with no name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Change analysis is skipped when the nameless fraction reaches this.
    #[serde(default = "default_analysis_max_nameless")]
    pub analysis_max_nameless: f64,
    /// Snapshot saving is aborted when the nameless fraction reaches this.
    #[serde(default = "default_save_max_nameless")]
    pub save_max_nameless: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            analysis_max_nameless: default_analysis_max_nameless(),
            save_max_nameless: default_save_max_nameless(),
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for snapshots and activity logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// File holding the raw session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_file: Option<PathBuf>,
}

// Default value functions for serde
fn default_users_base_url() -> String {
    "https://users.roblox.com".to_string()
}

fn default_friends_base_url() -> String {
    "https://friends.roblox.com".to_string()
}

fn default_user_agent() -> String {
    "Roblox/WinInet".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    50
}

fn default_rate_limit_delay_ms() -> u64 {
    5000
}

fn default_max_rate_limit_waits() -> u32 {
    20
}

fn default_batch_size() -> usize {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_connection_error_delay_ms() -> u64 {
    1000
}

fn default_analysis_max_nameless() -> f64 {
    0.5
}

fn default_save_max_nameless() -> f64 {
    0.2
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| TrackerError::ConfigError {
        message: "could not determine the user configuration directory".to_string(),
    })?;

    Ok(config_dir.join("friend-tracker").join("config.toml"))
}

/// Get the default data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| TrackerError::ConfigError {
        message: "could not determine the user data directory".to_string(),
    })?;

    Ok(data_dir.join("friend-tracker"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.enrich.batch_size, 50);
        assert_eq!(config.enrich.max_retries, 3);
        assert_eq!(config.fetch.rate_limit_delay(), Duration::from_secs(5));
        assert!((config.guard.analysis_max_nameless - 0.5).abs() < f64::EPSILON);
        assert!((config.guard.save_max_nameless - 0.2).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[enrich]
batch_size = 25

[guard]
save_max_nameless = 0.1
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.enrich.batch_size, 25);
        assert_eq!(config.enrich.max_retries, 3);
        assert!((config.guard.save_max_nameless - 0.1).abs() < f64::EPSILON);
        assert!((config.guard.analysis_max_nameless - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.api.users_base_url, "https://users.roblox.com");
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let mut config = Config::default();
        config.enrich.batch_size = 50;
        assert!(config.validate().is_ok());

        config.enrich.batch_size = 51;
        assert!(matches!(
            config.validate(),
            Err(TrackerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.guard.analysis_max_nameless = 1.5;
        assert!(config.validate().is_err());

        config.guard.analysis_max_nameless = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cookie_file_defaults_into_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/tmp/tracker"));
        assert_eq!(
            config.cookie_file().unwrap(),
            PathBuf::from("/tmp/tracker/cookie.txt")
        );

        config.storage.cookie_file = Some(PathBuf::from("/etc/cookie"));
        assert_eq!(config.cookie_file().unwrap(), PathBuf::from("/etc/cookie"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.fetch.page_size = 100;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.fetch.page_size, 100);
    }
}
