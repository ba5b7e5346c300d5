//! Messages consumed by the session controller's single event loop.

use std::path::PathBuf;

use shared::{
    domain::FileFormat,
    protocol::{LogsResponse, StartCrawlResponse, StatusResponse, StopCrawlResponse},
};

use crate::error::ClientError;

#[derive(Debug)]
pub enum ControllerMsg {
    Command(UserCommand),
    /// Activity on connection attempt `generation`.
    Stream {
        generation: u64,
        event: StreamEvent,
    },
    Timer {
        kind: TimerKind,
        token: u64,
    },
    Api(ApiOutcome),
}

/// User intent coming from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Open the event stream now unless it is already connected.
    Connect,
    Start { exam_id: String, format: FileFormat },
    Stop,
    RefreshStatus,
    FetchServerLogs,
    DownloadResults,
    ClearLogs,
    ExamIdEdited(String),
    Shutdown,
}

#[derive(Debug)]
pub enum StreamEvent {
    Opened,
    Frame(String),
    Failed(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Reconnect,
    DismissNotification,
    HideProgress,
}

/// Completion of a request the controller spawned.
#[derive(Debug)]
pub enum ApiOutcome {
    Started(Result<StartCrawlResponse, ClientError>),
    Stopped(Result<StopCrawlResponse, ClientError>),
    Status(Result<StatusResponse, ClientError>),
    ServerLogs(Result<LogsResponse, ClientError>),
    Downloaded(Result<PathBuf, ClientError>),
}
