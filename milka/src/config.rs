//! Milka configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main Milka configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Remote backend endpoints
    pub backend: BackendConfig,

    /// Story playback timing
    pub playback: PlaybackConfig,

    /// Local data files
    pub data: DataConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .milka.yml
        let local_config = PathBuf::from(".milka.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/milka/milka.yml
        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".milka.yml")];
                paths.extend(Self::user_config_path());
                paths
            }
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("milka").join("milka.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote backend configuration
///
/// The backend exposes three functions (auth, chats, messages). Either set
/// `base-url` and let the paths default to `/auth`, `/chats`, `/messages`,
/// or set each URL explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    #[serde(rename = "auth-url")]
    pub auth_url: Option<String>,

    #[serde(rename = "chats-url")]
    pub chats_url: Option<String>,

    #[serde(rename = "messages-url")]
    pub messages_url: Option<String>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_url: None,
            chats_url: None,
            messages_url: None,
            timeout_ms: 10_000,
        }
    }
}

/// Fully resolved backend URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub chats: String,
    pub messages: String,
}

impl BackendConfig {
    /// Resolve endpoint URLs; `None` when the backend is not configured
    pub fn endpoints(&self) -> Option<Endpoints> {
        let base = self.base_url.as_deref().map(|b| b.trim_end_matches('/'));
        let resolve = |explicit: &Option<String>, path: &str| {
            explicit
                .clone()
                .or_else(|| base.map(|b| format!("{}/{}", b, path)))
        };

        Some(Endpoints {
            auth: resolve(&self.auth_url, "auth")?,
            chats: resolve(&self.chats_url, "chats")?,
            messages: resolve(&self.messages_url, "messages")?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoints().is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Story playback timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Time each story item stays on screen
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,

    /// Pause on the full progress bar before the viewer closes
    #[serde(rename = "finish-delay-ms")]
    pub finish_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: 3000,
            finish_delay_ms: 300,
        }
    }
}

impl PlaybackConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn finish_delay(&self) -> Duration {
        Duration::from_millis(self.finish_delay_ms)
    }
}

/// Local data files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// YAML directory (statuses, chats, channels, calls, contacts); sample data when unset
    #[serde(rename = "directory-file")]
    pub directory_file: Option<PathBuf>,

    /// Where the signed-in session is kept
    #[serde(rename = "session-file")]
    pub session_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.log_level.is_none());
        assert!(!config.backend.is_configured());
        assert_eq!(config.playback.tick_ms, 3000);
        assert_eq!(config.playback.finish_delay_ms, 300);
        assert!(config.data.directory_file.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

backend:
  base-url: https://functions.example.com/
  messages-url: https://msg.example.com/send
  timeout-ms: 5000

playback:
  tick-ms: 1000
  finish-delay-ms: 100

data:
  directory-file: /tmp/milka/directory.yml
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.backend.timeout(), Duration::from_millis(5000));
        assert_eq!(config.playback.tick_period(), Duration::from_millis(1000));
        assert_eq!(config.playback.finish_delay(), Duration::from_millis(100));
        assert_eq!(
            config.data.directory_file,
            Some(PathBuf::from("/tmp/milka/directory.yml"))
        );

        let endpoints = config.backend.endpoints().unwrap();
        assert_eq!(endpoints.auth, "https://functions.example.com/auth");
        assert_eq!(endpoints.chats, "https://functions.example.com/chats");
        assert_eq!(endpoints.messages, "https://msg.example.com/send");
    }

    #[test]
    fn test_partial_backend_is_not_configured() {
        let yaml = r#"
backend:
  auth-url: https://a.example.com
  chats-url: https://c.example.com
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.backend.endpoints().is_none());
        assert_eq!(config.backend.timeout_ms, 10_000);
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let playback = PlaybackConfig {
            tick_ms: 0,
            finish_delay_ms: 0,
        };
        assert_eq!(playback.tick_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "playback:\n  tick-ms: 250").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.playback.tick_ms, 250);
        assert_eq!(config.playback.finish_delay_ms, 300);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/milka.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_log_level_from_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: WARN").unwrap();
        let path = file.path().to_path_buf();

        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("WARN"));
        assert_eq!(Config::load_log_level(Some(&PathBuf::from("/nonexistent/x.yml"))), None);
    }
}
