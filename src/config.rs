// ABOUTME: Application configuration loaded from ~/.kube-term/config.toml
// Dashboard origin, development host override, cluster and session timings

use crate::terminal::{endpoint::EndpointConfig, session::SessionTimings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the dashboard serving the PTY bridge
    pub server: String,
    pub development: bool,
    /// Host used instead of the origin's host in development mode
    pub dev_host: Option<String>,
    pub cluster: String,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8080".to_string(),
            development: false,
            dev_host: None,
            cluster: "default".to_string(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub keepalive_secs: u64,
    pub sample_interval_ms: u64,
    pub rate_window_secs: u64,
    pub resize_debounce_ms: u64,
    pub resize_settle_ms: u64,
    pub scrollback_lines: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let timings = SessionTimings::default();
        Self {
            keepalive_secs: timings.keepalive_interval.as_secs(),
            sample_interval_ms: timings.sample_interval.as_millis() as u64,
            rate_window_secs: timings.rate_window.as_secs(),
            resize_debounce_ms: timings.resize_debounce.as_millis() as u64,
            resize_settle_ms: timings.resize_settle.as_millis() as u64,
            scrollback_lines: timings.scrollback_lines,
        }
    }
}

impl SessionConfig {
    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            keepalive_interval: Duration::from_secs(self.keepalive_secs.max(1)),
            sample_interval: Duration::from_millis(self.sample_interval_ms.max(1)),
            rate_window: Duration::from_secs(self.rate_window_secs.max(1)),
            resize_debounce: Duration::from_millis(self.resize_debounce_ms),
            resize_settle: Duration::from_millis(self.resize_settle_ms),
            scrollback_lines: self.scrollback_lines,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("unable to determine home directory")?;
        Ok(home.join(".kube-term").join("config.toml"))
    }

    /// Load from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the default config file, or defaults when there is none
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn endpoint(&self) -> Result<EndpointConfig> {
        let endpoint = EndpointConfig::new(&self.server)?
            .with_dev_host(self.dev_host.clone(), self.development);
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
server = "https://dash.example.com"
cluster = "prod"

[session]
keepalive_secs = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server, "https://dash.example.com");
        assert_eq!(config.cluster, "prod");
        assert!(!config.development);
        assert_eq!(config.session.keepalive_secs, 10);
        assert_eq!(config.session.sample_interval_ms, 500);

        let timings = config.session.timings();
        assert_eq!(timings.keepalive_interval, Duration::from_secs(10));
        assert_eq!(timings.rate_window, Duration::from_secs(3));
        assert_eq!(timings.scrollback_lines, 10_000);
    }

    #[test]
    fn test_default_timings_match_session_defaults() {
        assert_eq!(SessionConfig::default().timings(), SessionTimings::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "server = [").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_endpoint_rejects_bad_origin() {
        let config = AppConfig {
            server: "not a url".to_string(),
            ..AppConfig::default()
        };
        assert!(config.endpoint().is_err());
    }
}
