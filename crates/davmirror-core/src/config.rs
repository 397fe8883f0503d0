//! Application configuration
//!
//! Configuration is loaded from a TOML file with a single `[yandex]` table:
//!
//! ```toml
//! [yandex]
//! local_path = "/home/me/Sync"
//! sync_period = 5            # minutes
//! log_path = "/home/me/.local/state/davmirror.log"
//! token = "y0_AgAAAA..."
//! cloud_path = "backup"      # required, may be empty
//! ```
//!
//! The file is looked up at:
//! 1. The path given on the command line
//! 2. `DAVMIRROR_CONFIG`
//! 3. `~/.config/davmirror/config.toml`
//!
//! `DAVMIRROR_TOKEN`, `DAVMIRROR_LOCAL_PATH` and `DAVMIRROR_CLOUD_PATH`
//! override the file before validation. Unlike most settings files, a
//! missing file is an error: the agent cannot run on defaults.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::remote::{RemoteClientConfig, DEFAULT_BASE_URL};

/// Environment variable prefix
const ENV_PREFIX: &str = "DAVMIRROR";

/// Name of the provider table in the config file
pub const PROVIDER_SECTION: &str = "yandex";

/// Keys that must be present and non-empty
const REQUIRED_KEYS: &[&str] = &["local_path", "sync_period", "log_path", "token"];

/// Configuration errors; all of them stop the agent at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Section [{0}] is missing from the configuration file")]
    MissingSection(&'static str),

    #[error("Parameter '{0}' is missing or empty in the configuration file")]
    MissingKey(&'static str),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
struct RawFile {
    yandex: Option<RawSection>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawSection {
    local_path: Option<String>,
    sync_period: Option<f64>,
    log_path: Option<String>,
    token: Option<String>,
    cloud_path: Option<String>,
    base_url: Option<String>,
}

/// Validated agent configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory mirrored to the remote
    pub local_path: PathBuf,
    /// Pause between cycles
    pub sync_period: Duration,
    /// Log file
    pub log_path: PathBuf,
    /// OAuth token
    pub token: String,
    /// Remote collection, relative to the server root
    pub cloud_path: String,
    /// WebDAV server root
    pub base_url: String,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(cli_path: Option<&PathBuf>) -> ConfigResult<Self> {
        match cli_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> ConfigResult<Self> {
        Self::parse(toml_content, Path::new("<string>"))
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        let raw: RawFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut section = raw
            .yandex
            .ok_or(ConfigError::MissingSection(PROVIDER_SECTION))?;
        apply_env_overrides(&mut section);
        validate(section)
    }

    /// Get the config file path
    ///
    /// Can be overridden with DAVMIRROR_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("davmirror")
            .join("config.toml")
    }

    /// Connection settings for the remote client
    pub fn remote_config(&self) -> RemoteClientConfig {
        RemoteClientConfig {
            base_url: self.base_url.clone(),
            cloud_path: self.cloud_path.clone(),
            auth_token: self.token.clone(),
        }
    }

    /// Token with everything but the last four characters hidden
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

/// Apply environment variable overrides
fn apply_env_overrides(section: &mut RawSection) {
    // DAVMIRROR_TOKEN
    if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
        section.token = Some(val);
    }

    // DAVMIRROR_LOCAL_PATH
    if let Ok(val) = std::env::var(format!("{}_LOCAL_PATH", ENV_PREFIX)) {
        section.local_path = Some(val);
    }

    // DAVMIRROR_CLOUD_PATH
    if let Ok(val) = std::env::var(format!("{}_CLOUD_PATH", ENV_PREFIX)) {
        section.cloud_path = Some(val);
    }
}

fn validate(section: RawSection) -> ConfigResult<Config> {
    let non_empty = |value: Option<String>, key: &'static str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingKey(key))
    };

    let local_path = non_empty(section.local_path, REQUIRED_KEYS[0])?;
    let minutes = section
        .sync_period
        .ok_or(ConfigError::MissingKey(REQUIRED_KEYS[1]))?;
    let log_path = non_empty(section.log_path, REQUIRED_KEYS[2])?;
    let token = non_empty(section.token, REQUIRED_KEYS[3])?;
    let cloud_path = section
        .cloud_path
        .ok_or(ConfigError::MissingKey("cloud_path"))?;

    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "sync_period",
            reason: format!("expected a positive number of minutes, got {}", minutes),
        });
    }
    let sync_period =
        Duration::try_from_secs_f64(minutes * 60.0).map_err(|e| ConfigError::InvalidValue {
            key: "sync_period",
            reason: e.to_string(),
        })?;

    let base_url = section
        .base_url
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    match Url::parse(&base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        Ok(_) => {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                reason: format!("'{}' cannot carry a path", base_url),
            })
        }
        Err(e) => {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                reason: format!("'{}': {}", base_url, e),
            })
        }
    }

    Ok(Config {
        local_path: PathBuf::from(local_path),
        sync_period,
        log_path: PathBuf::from(log_path),
        token,
        cloud_path,
        base_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "DAVMIRROR_TOKEN",
        "DAVMIRROR_LOCAL_PATH",
        "DAVMIRROR_CLOUD_PATH",
        "DAVMIRROR_CONFIG",
    ];

    const VALID: &str = r#"
        [yandex]
        local_path = "/data/sync"
        sync_period = 5
        log_path = "/var/log/davmirror.log"
        token = "y0_secret_token"
        cloud_path = "backup"
    "#;

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(VALID).unwrap();
        assert_eq!(config.local_path, PathBuf::from("/data/sync"));
        assert_eq!(config.sync_period, Duration::from_secs(300));
        assert_eq!(config.log_path, PathBuf::from("/var/log/davmirror.log"));
        assert_eq!(config.token, "y0_secret_token");
        assert_eq!(config.cloud_path, "backup");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_fractional_period_and_custom_base_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(
            r#"
            [yandex]
            local_path = "/data"
            sync_period = 0.5
            log_path = "sync.log"
            token = "t"
            cloud_path = ""
            base_url = "https://dav.example.org/remote.php/webdav"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync_period, Duration::from_secs(30));
        assert_eq!(config.cloud_path, "");
        assert_eq!(config.base_url, "https://dav.example.org/remote.php/webdav");
    }

    #[test]
    fn test_missing_section() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str("[dropbox]\ntoken = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection("yandex")));
    }

    #[test]
    fn test_empty_required_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = VALID.replace("y0_secret_token", "");
        let err = Config::load_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("token")));
    }

    #[test]
    fn test_missing_required_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = VALID.replace("sync_period = 5", "");
        let err = Config::load_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("sync_period")));
    }

    #[test]
    fn test_cloud_path_must_be_present() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = VALID.replace("cloud_path = \"backup\"", "");
        let err = Config::load_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("cloud_path")));
    }

    #[test]
    fn test_non_positive_period() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = VALID.replace("sync_period = 5", "sync_period = 0");
        let err = Config::load_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "sync_period", .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        for bad in ["not a url", "mailto:me@example.com"] {
            let toml = format!("{}base_url = \"{}\"\n", VALID, bad);
            let err = Config::load_from_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { key: "base_url", .. }));
        }

        let toml = format!("{}base_url = \"http://127.0.0.1:8080\"\n", VALID);
        let config = Config::load_from_str(&toml).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_parse_error() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str("[yandex\nlocal_path = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("DAVMIRROR_TOKEN", "from-env");
        env::set_var("DAVMIRROR_CLOUD_PATH", "elsewhere");
        let config = Config::load_from_str(VALID).unwrap();

        assert_eq!(config.token, "from-env");
        assert_eq!(config.cloud_path, "elsewhere");
        assert_eq!(config.local_path, PathBuf::from("/data/sync"));
    }

    #[test]
    fn test_env_override_fills_missing_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("DAVMIRROR_TOKEN", "only-in-env");
        let toml = VALID.replace("token = \"y0_secret_token\"", "");
        let config = Config::load_from_str(&toml).unwrap();
        assert_eq!(config.token, "only-in-env");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_path(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let _guard = EnvGuard::new(ENV_VARS);

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, VALID).unwrap();

        let config = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(config.cloud_path, "backup");
    }

    #[test]
    fn test_config_file_path_env_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::config_file_path().ends_with("davmirror/config.toml"));

        env::set_var("DAVMIRROR_CONFIG", "/etc/davmirror.toml");
        assert_eq!(
            Config::config_file_path(),
            PathBuf::from("/etc/davmirror.toml")
        );
    }

    #[test]
    fn test_remote_config_and_masking() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(VALID).unwrap();
        let remote = config.remote_config();
        assert_eq!(remote.cloud_path, "backup");
        assert_eq!(remote.auth_token, "y0_secret_token");

        assert_eq!(config.masked_token(), "****oken");
    }
}
