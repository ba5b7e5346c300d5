use std::fmt;

use chrono::{DateTime, Local};
use shared::domain::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    System,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::System => "system",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub severity: Severity,
    pub recorded_at: DateTime<Local>,
}

impl LogEntry {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            recorded_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

/// Icon hint for the results card, keyed by the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Csv,
    Excel,
    Code,
    Generic,
}

impl FileIcon {
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "CSV" => Self::Csv,
            "XLSX" => Self::Excel,
            "JSON" | "XML" => Self::Code,
            _ => Self::Generic,
        }
    }
}

/// What the results card shows once a crawl produced a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub filename: String,
    pub collected_count: u64,
    /// Upper-cased extension of `filename`, e.g. `CSV`.
    pub format_label: String,
    pub icon: FileIcon,
    pub download_url: String,
}

impl ResultsView {
    pub fn new(filename: impl Into<String>, collected_count: u64, download_url: String) -> Self {
        let filename = filename.into();
        // No dot means the whole name stands in for the extension.
        let format_label = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        let icon = FileIcon::for_extension(&format_label);
        Self {
            filename,
            collected_count,
            format_label,
            icon,
            download_url,
        }
    }
}

/// Read-only snapshot of controller state, handy for front ends and tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerSnapshot {
    pub connection: ConnectionState,
    pub job: JobState,
    pub session_id: Option<SessionId>,
    pub reconnect_pending: bool,
    pub log_len: usize,
}
