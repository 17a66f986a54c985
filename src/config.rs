//! Runtime configuration.
//!
//! Layered: built-in defaults, then an optional `historica.toml` (or the file
//! named by `HISTORICA_CONFIG`), then `HISTORICA_*` environment variables.
//! `.env` files are loaded into the environment first via `dotenvy`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_FALLBACK_MODEL: &str = "/models/taj_mahal.glb";
pub const DEFAULT_CHAT_REPLY_MS: u64 = 1000;
pub const DEFAULT_SETTLE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub fallback_model: String,
    pub chat_reply_delay: Duration,
    pub settle_delay: Duration,
    pub log_dir: Option<PathBuf>,
}

/// Shape of the optional TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    bind: Option<String>,
    data_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    fallback_model: Option<String>,
    chat_reply_ms: Option<u64>,
    settle_ms: Option<u64>,
    log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_dir: default_data_dir(),
            assets_dir: PathBuf::from("public"),
            fallback_model: DEFAULT_FALLBACK_MODEL.into(),
            chat_reply_delay: Duration::from_millis(DEFAULT_CHAT_REPLY_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            log_dir: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("historica")
}

/// Return the first non-empty value from the given environment variable keys.
pub fn env_var_first_nonempty(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

impl Config {
    /// Load `.env`, the optional config file, and environment overrides.
    pub fn from_env() -> Result<Self, AppError> {
        // Missing .env is the common case.
        let _ = dotenvy::dotenv();

        let mut config = Config::default();

        let file = env_var_first_nonempty(&["HISTORICA_CONFIG"])
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from("historica.toml");
                local.exists().then_some(local)
            });
        if let Some(path) = file {
            config.apply_file(&path)?;
        }

        config.apply_env(|key| env_var_first_nonempty(&[key]))?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), AppError> {
        let raw = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;

        if let Some(bind) = file.bind {
            self.bind = parse_bind(&bind)?;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = file.assets_dir {
            self.assets_dir = dir;
        }
        if let Some(model) = file.fallback_model {
            self.fallback_model = model;
        }
        if let Some(ms) = file.chat_reply_ms {
            self.chat_reply_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.settle_ms {
            self.settle_delay = Duration::from_millis(ms);
        }
        if file.log_dir.is_some() {
            self.log_dir = file.log_dir;
        }

        tracing::debug!(path = %path.display(), "Applied config file");
        Ok(())
    }

    /// Apply overrides from a key lookup. Split out from `from_env` so tests
    /// don't have to mutate the process environment.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        if let Some(bind) = lookup("HISTORICA_BIND") {
            self.bind = parse_bind(&bind)?;
        }
        if let Some(dir) = lookup("HISTORICA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("HISTORICA_ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("HISTORICA_FALLBACK_MODEL") {
            self.fallback_model = model;
        }
        if let Some(ms) = lookup("HISTORICA_CHAT_REPLY_MS") {
            self.chat_reply_delay = Duration::from_millis(parse_millis("HISTORICA_CHAT_REPLY_MS", &ms)?);
        }
        if let Some(ms) = lookup("HISTORICA_SETTLE_MS") {
            self.settle_delay = Duration::from_millis(parse_millis("HISTORICA_SETTLE_MS", &ms)?);
        }
        if let Some(dir) = lookup("HISTORICA_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }
}

fn parse_bind(value: &str) -> Result<SocketAddr, AppError> {
    value
        .parse()
        .map_err(|e| AppError::Config(format!("invalid bind address '{value}': {e}")))
}

fn parse_millis(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a whole number of milliseconds, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.chat_reply_delay, Duration::from_millis(1000));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.fallback_model, "/models/taj_mahal.glb");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("HISTORICA_BIND", "0.0.0.0:8080"),
                ("HISTORICA_SETTLE_MS", "250"),
                ("HISTORICA_LOG_DIR", "/tmp/historica-logs"),
            ]))
            .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/historica-logs")));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("HISTORICA_CHAT_REPLY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historica.toml");
        std::fs::write(&path, "bind = \"127.0.0.1:7000\"\nchat_reply_ms = 10\n").unwrap();

        let mut config = Config::default();
        config.apply_file(&path).unwrap();
        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.chat_reply_delay, Duration::from_millis(10));

        config.apply_env(lookup(&[("HISTORICA_BIND", "127.0.0.1:7001")])).unwrap();
        assert_eq!(config.bind.port(), 7001);
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historica.toml");
        std::fs::write(&path, "port = 1\n").unwrap();
        let err = Config::default().apply_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
