use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_IOT_URL: &str = "https://moriahmkt.com";
const DEFAULT_HISTORY_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_HISTORY_REFRESH_SECS: u64 = 300;
const DEFAULT_SESSION_FLAG: &str = ".agro-session";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    pub iot_base_url: Option<String>,
    pub history_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Snapshot polling period
    pub refresh_secs: Option<u64>,
    /// Auto-refresh period of the 24h historical window
    pub history_refresh_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    pub flag_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: Option<ApiConfig>,
    pub sync: Option<SyncConfig>,
    pub session: Option<SessionConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {0}: must be greater than zero")]
    ZeroPeriod(&'static str),
}

impl AppConfig {
    /// Load configuration from AGRO_CONFIG path (TOML) if present, then apply
    /// AGRO_IOT_URL / AGRO_HISTORY_URL overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AGRO_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a TOML file; a missing file yields defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Override base URLs from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = self.api.get_or_insert_with(ApiConfig::default);
        if let Some(url) = lookup("AGRO_IOT_URL") {
            api.iot_base_url = Some(url);
        }
        if let Some(url) = lookup("AGRO_HISTORY_URL") {
            api.history_base_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sync = self.sync.as_ref();
        if sync.and_then(|s| s.refresh_secs) == Some(0) {
            return Err(ConfigError::ZeroPeriod("sync.refresh_secs"));
        }
        if sync.and_then(|s| s.history_refresh_secs) == Some(0) {
            return Err(ConfigError::ZeroPeriod("sync.history_refresh_secs"));
        }
        if self.api.as_ref().and_then(|a| a.timeout_secs) == Some(0) {
            return Err(ConfigError::ZeroPeriod("api.timeout_secs"));
        }
        Ok(())
    }

    /// Base URL of the snapshot API (default https://moriahmkt.com)
    pub fn iot_base_url(&self) -> String {
        self.api
            .as_ref()
            .and_then(|a| a.iot_base_url.clone())
            .unwrap_or_else(|| DEFAULT_IOT_URL.to_string())
    }

    /// Base URL of the history API (default http://localhost:5000/api)
    pub fn history_base_url(&self) -> String {
        self.api
            .as_ref()
            .and_then(|a| a.history_base_url.clone())
            .unwrap_or_else(|| DEFAULT_HISTORY_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Snapshot polling period (default 60s)
    pub fn refresh_period(&self) -> Duration {
        let secs = self
            .sync
            .as_ref()
            .and_then(|s| s.refresh_secs)
            .unwrap_or(DEFAULT_REFRESH_SECS);
        Duration::from_secs(secs)
    }

    /// 24h chart auto-refresh period (default 5 minutes)
    pub fn history_refresh_period(&self) -> Duration {
        let secs = self
            .sync
            .as_ref()
            .and_then(|s| s.history_refresh_secs)
            .unwrap_or(DEFAULT_HISTORY_REFRESH_SECS);
        Duration::from_secs(secs)
    }

    pub fn session_flag_path(&self) -> PathBuf {
        self.session
            .as_ref()
            .and_then(|s| s.flag_path.clone())
            .unwrap_or_else(|| DEFAULT_SESSION_FLAG.to_string())
            .into()
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}
