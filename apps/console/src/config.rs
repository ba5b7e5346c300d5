use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{
    event_stream_url,
    settings::{DEFAULT_SERVER_URL, LOG_CAPACITY, NOTIFICATION_TTL, PROGRESS_HIDE_DELAY, RECONNECT_DELAY},
    ClientSettings, Timings,
};
use shared::domain::FileFormat;
use tracing::warn;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "crawl-console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub download_dir: PathBuf,
    pub default_format: FileFormat,
    pub reconnect_delay_secs: u64,
    pub notification_secs: u64,
    pub progress_hide_secs: u64,
    pub log_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            download_dir: PathBuf::from("downloads"),
            default_format: FileFormat::Csv,
            reconnect_delay_secs: RECONNECT_DELAY.as_secs(),
            notification_secs: NOTIFICATION_TTL.as_secs(),
            progress_hide_secs: PROGRESS_HIDE_DELAY.as_secs(),
            log_capacity: LOG_CAPACITY,
        }
    }
}

impl Settings {
    /// Validates the server URL and builds the controller settings.
    pub fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        let server_url = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        event_stream_url(&server_url)
            .with_context(|| format!("server url '{server_url}' must use http or https"))?;
        if self.log_capacity == 0 {
            bail!("log_capacity must be at least 1");
        }

        let mut settings = ClientSettings::new(server_url);
        settings.download_dir = self.download_dir.clone();
        settings.log_capacity = self.log_capacity;
        settings.timings = Timings {
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            notification_ttl: Duration::from_secs(self.notification_secs),
            progress_hide_delay: Duration::from_secs(self.progress_hide_secs),
        };
        Ok(settings)
    }
}

/// Defaults, then the TOML file, then environment variables.
///
/// `config_path` must exist when given; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                if let Err(err) = apply_file(&mut settings, &raw) {
                    warn!("ignoring {DEFAULT_CONFIG_FILE}: {err:#}");
                }
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table = toml::from_str::<toml::Table>(raw)?;
    let file_cfg: HashMap<String, String> = table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();

    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("download_dir") {
        settings.download_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("default_format") {
        settings.default_format = v.parse()?;
    }
    if let Some(v) = file_cfg.get("reconnect_delay_secs") {
        settings.reconnect_delay_secs = v.parse().context("reconnect_delay_secs")?;
    }
    if let Some(v) = file_cfg.get("notification_secs") {
        settings.notification_secs = v.parse().context("notification_secs")?;
    }
    if let Some(v) = file_cfg.get("progress_hide_secs") {
        settings.progress_hide_secs = v.parse().context("progress_hide_secs")?;
    }
    if let Some(v) = file_cfg.get("log_capacity") {
        settings.log_capacity = v.parse().context("log_capacity")?;
    }
    Ok(())
}

/// Unparseable numeric or format values are skipped with a warning.
pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CRAWL_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__DEFAULT_FORMAT") {
        match v.parse() {
            Ok(format) => settings.default_format = format,
            Err(err) => warn!("ignoring APP__DEFAULT_FORMAT: {err}"),
        }
    }

    if let Some(v) = var("APP__RECONNECT_DELAY_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.reconnect_delay_secs = parsed,
            Err(err) => warn!("ignoring APP__RECONNECT_DELAY_SECS={v}: {err}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
