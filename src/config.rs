use crate::fetch::RetryPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";
pub const BASE_URL_ENV: &str = "PRACTICE_API_BASE_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub sidebar: SidebarConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SidebarConfig {
    /// Seconds a fetched topic list stays fresh. Absent means forever.
    pub cache_ttl_s: Option<u64>,
}

impl SidebarConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_s.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    #[serde(default = "default_prefs_path")]
    pub path: PathBuf,
}

fn default_prefs_path() -> PathBuf {
    PathBuf::from("preferences.json")
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("practice.log")
}

fn default_log_filter() -> String {
    "practice_core=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Parse `path`, falling back to defaults when the file does not exist.
    /// `PRACTICE_API_BASE_URL` overrides `[api] base_url`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.api.base_url = url.trim().to_string(),
            _ => {}
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let content = match std::fs::read_to_string(Path::new(ENV_FILE)) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

/// KEY=VALUE lines; blanks, comments and lines without `=` are skipped.
fn parse_env(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
