use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Context;
use serde::Deserialize;

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.drebedengi.ru";
pub(crate) const DEFAULT_CREDENTIALS_FILE: &str = "credentials.txt";
pub(crate) const DEFAULT_DATABASE_FILE: &str = "drebedengi.sqlite3";
const DEFAULT_MAX_BACKUP_AGE_MINUTES: i64 = 60;

/// Settings read from `config.toml`. Every key is optional, command line options take precedence.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) base_url: Option<String>,
    pub(crate) credentials: Option<PathBuf>,
    pub(crate) database: Option<PathBuf>,
    pub(crate) max_backup_age_minutes: Option<i64>,
}

impl Config {
    pub(crate) fn empty() -> Config {
        Config::default()
    }

    /// Default location of the config file, e.g. `~/.config/drebedengi/config.toml` on Linux.
    pub(crate) fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drebedengi").join("config.toml"))
    }

    /// Load config from `file_path`. A missing file yields an empty config unless `required` is set.
    pub(crate) fn load_from_file(file_path: &Path, required: bool) -> anyhow::Result<Config> {
        if file_path.is_file() {
            let content = fs::read_to_string(file_path)
                .with_context(|| format!("Unable to read config file {}", file_path.display()))?;
            Config::parse(&content)
                .with_context(|| format!("Invalid config file {}", file_path.display()))
        } else if required {
            Err(anyhow::anyhow!("Config file {} not found", file_path.display()))
        } else {
            Ok(Config::empty())
        }
    }

    pub(crate) fn parse(content: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str::<Config>(content)?)
    }

    pub(crate) fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/')
    }

    pub(crate) fn max_backup_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.max_backup_age_minutes.unwrap_or(DEFAULT_MAX_BACKUP_AGE_MINUTES))
    }
}
