use std::{path::PathBuf, time::Duration};

use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);
pub const PROGRESS_HIDE_DELAY: Duration = Duration::from_secs(2);
pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait between losing the event stream and the next connection attempt.
    pub reconnect_delay: Duration,
    /// How long a notification banner stays up.
    pub notification_ttl: Duration,
    /// How long the progress view lingers at 100% after completion.
    pub progress_hide_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reconnect_delay: RECONNECT_DELAY,
            notification_ttl: NOTIFICATION_TTL,
            progress_hide_delay: PROGRESS_HIDE_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub server_url: Url,
    pub download_dir: PathBuf,
    pub timings: Timings,
    pub log_capacity: usize,
}

impl ClientSettings {
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            download_dir: PathBuf::from("downloads"),
            timings: Timings::default(),
            log_capacity: LOG_CAPACITY,
        }
    }
}
