//! Session controller: turns user commands, stream frames, timers and request
//! completions into state transitions and view updates.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::{
    domain::{exam_id_input_flagged, ExamId, FileFormat, SessionId},
    protocol::{
        CompletePayload, LogsResponse, ServerEvent, StartCrawlRequest, StartCrawlResponse,
        StatusResponse, StopCrawlResponse,
    },
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    connection::ConnectionManager,
    context::AppContext,
    error::ClientError,
    events::{ApiOutcome, ControllerMsg, StreamEvent, TimerKind, UserCommand},
    presenter::Presenter,
    protocol_client::{download_url, JobApi},
    timer::TimerSlot,
    transport::event_stream_url,
    types::{
        ConnectionState, ControllerSnapshot, JobState, LogEntry, NotificationKind, ResultsView,
        Severity,
    },
    view::RenderPort,
};

const STREAM_CONNECTED: &str = "Event stream connected.";
const STREAM_LOST: &str = "Event stream disconnected. Reconnecting...";
const STREAM_ERROR: &str = "Event stream error occurred.";
const INVALID_EXAM_ID: &str = "Enter a valid numeric exam ID.";
const CONNECTION_REQUIRED: &str = "A server connection is required. Please try again shortly.";
const PREPARING: &str = "Preparing to start crawling...";
const SERVER_IDLE: &str = "The server is no longer crawling; the job was marked idle.";
const NO_RESULTS: &str = "No results available to download.";
const DEFAULT_RESULT_FILENAME: &str = "results";

pub struct SessionController {
    ctx: AppContext,
    connection: ConnectionManager,
    presenter: Presenter,
    job: JobState,
    session_id: Option<SessionId>,
    results: Option<ResultsView>,
    progress_hide: TimerSlot,
    shut_down: bool,
}

impl SessionController {
    pub fn new(ctx: AppContext, view: Box<dyn RenderPort>) -> Result<Self, ClientError> {
        let url = event_stream_url(&ctx.settings.server_url)?;
        let timings = ctx.settings.timings;
        let connection =
            ConnectionManager::new(Arc::clone(&ctx.connector), url, timings.reconnect_delay);
        let presenter = Presenter::new(view, ctx.settings.log_capacity, timings.notification_ttl);
        Ok(Self {
            ctx,
            connection,
            presenter,
            job: JobState::Idle,
            session_id: None,
            results: None,
            progress_hide: TimerSlot::new(TimerKind::HideProgress),
            shut_down: false,
        })
    }

    /// Connects, then processes queued messages in order until shut down.
    /// Returns once the event stream has been closed.
    pub async fn run(mut self, mut rx: UnboundedReceiver<ControllerMsg>) {
        self.connect();
        while !self.shut_down {
            let Some(msg) = rx.recv().await else {
                self.shutdown();
                break;
            };
            self.handle(msg);
        }
        self.connection.wait_closed().await;
    }

    pub fn connect(&mut self) {
        self.connection.connect(self.ctx.sender());
    }

    pub fn handle(&mut self, msg: ControllerMsg) {
        if self.shut_down {
            return;
        }
        match msg {
            ControllerMsg::Command(command) => self.on_command(command),
            ControllerMsg::Stream { generation, event } => self.on_stream(generation, event),
            ControllerMsg::Timer { kind, token } => self.on_timer(kind, token),
            ControllerMsg::Api(outcome) => self.on_api(outcome),
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            connection: self.connection.state(),
            job: self.job,
            session_id: self.session_id.clone(),
            reconnect_pending: self.connection.reconnect_pending(),
            log_len: self.presenter.logs().len(),
        }
    }

    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.presenter.logs().iter()
    }

    pub fn results(&self) -> Option<&ResultsView> {
        self.results.as_ref()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn on_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::Connect => {
                if self.connection.is_connected() {
                    debug!("connect ignored: event stream already connected");
                } else {
                    self.connect();
                }
            }
            UserCommand::Start { exam_id, format } => self.start_job(&exam_id, format),
            UserCommand::Stop => self.stop_job(),
            UserCommand::RefreshStatus => {
                let api = Arc::clone(&self.ctx.api);
                self.spawn_request(async move { ApiOutcome::Status(api.status().await) });
            }
            UserCommand::FetchServerLogs => {
                let api = Arc::clone(&self.ctx.api);
                self.spawn_request(async move { ApiOutcome::ServerLogs(api.recent_logs().await) });
            }
            UserCommand::DownloadResults => self.download_results(),
            UserCommand::ClearLogs => self.presenter.clear_logs(),
            UserCommand::ExamIdEdited(value) => {
                let flagged = exam_id_input_flagged(&value);
                self.presenter.view().exam_id_flagged(flagged);
            }
            UserCommand::Shutdown => self.shutdown(),
        }
    }

    fn on_stream(&mut self, generation: u64, event: StreamEvent) {
        match event {
            StreamEvent::Opened => {
                if self.connection.mark_open(generation) {
                    info!(generation, "event stream: connected");
                    self.presenter
                        .view()
                        .connection_changed(ConnectionState::Connected);
                    self.presenter.log(STREAM_CONNECTED, Severity::System);
                }
            }
            StreamEvent::Frame(text) => {
                if self.connection.is_current(generation) {
                    self.dispatch(&text);
                } else {
                    debug!(generation, "event stream: dropping frame from replaced connection");
                }
            }
            StreamEvent::Failed(reason) => {
                if self.connection.is_current(generation) {
                    warn!(generation, reason = %reason, "event stream: error");
                    self.presenter.log(STREAM_ERROR, Severity::Error);
                }
            }
            StreamEvent::Closed => {
                if self.connection.mark_lost(generation) {
                    info!(generation, "event stream: disconnected");
                    self.presenter
                        .view()
                        .connection_changed(ConnectionState::Disconnected);
                    self.presenter.log(STREAM_LOST, Severity::Warning);
                    if self.connection.schedule_reconnect(self.ctx.sender()) {
                        debug!(
                            delay_ms = self.ctx.settings.timings.reconnect_delay.as_millis() as u64,
                            "event stream: reconnect scheduled"
                        );
                    }
                }
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind, token: u64) {
        match kind {
            TimerKind::Reconnect => {
                if self.connection.reconnect_due(token, self.ctx.sender()) {
                    debug!("event stream: reconnecting");
                }
            }
            TimerKind::DismissNotification => self.presenter.dismiss_due(token),
            TimerKind::HideProgress => {
                if self.progress_hide.fire(token) {
                    self.presenter.view().hide_progress();
                }
            }
        }
    }

    fn on_api(&mut self, outcome: ApiOutcome) {
        match outcome {
            ApiOutcome::Started(result) => self.on_started(result),
            ApiOutcome::Stopped(result) => self.on_stop_requested(result),
            ApiOutcome::Status(result) => self.on_status(result),
            ApiOutcome::ServerLogs(result) => self.on_server_logs(result),
            ApiOutcome::Downloaded(result) => match result {
                Ok(path) => {
                    let message = format!("Saved results to {}.", path.display());
                    info!(path = %path.display(), "results downloaded");
                    self.presenter.log(message.clone(), Severity::Success);
                    self.notify(message, NotificationKind::Success);
                }
                Err(err) => self.report_failure("Failed to download results", &err),
            },
        }
    }

    /// Parses one frame and applies it; bad frames only reach the tracing log.
    fn dispatch(&mut self, text: &str) {
        match ServerEvent::from_frame(text) {
            Ok(event) => self.apply_event(event),
            Err(err) => warn!(error = %err, "dropping malformed event frame"),
        }
    }

    fn apply_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Log { message } => self.presenter.log(message, Severity::Info),
            ServerEvent::Progress { progress, message } => {
                self.presenter
                    .view()
                    .set_progress(progress_percent(progress), &message);
            }
            ServerEvent::Status { message } => {
                self.presenter.view().set_status_message(&message);
                self.presenter.log(message, Severity::System);
            }
            ServerEvent::Complete(payload) => self.on_complete(payload),
            ServerEvent::Error { message } => {
                self.set_job(JobState::Idle);
                self.hide_progress();
                self.presenter.log(message.clone(), Severity::Error);
                self.notify(message, NotificationKind::Error);
            }
            ServerEvent::Stopped { message } => {
                self.set_job(JobState::Idle);
                self.hide_progress();
                self.presenter.log(message, Severity::Warning);
            }
            ServerEvent::Unknown { kind } => {
                debug!(kind = %kind, "ignoring event of unknown kind");
            }
        }
    }

    fn on_complete(&mut self, payload: CompletePayload) {
        let CompletePayload {
            message,
            collected_count,
            download_ready,
            filename,
            file_path,
        } = payload;

        self.set_job(JobState::Idle);
        self.presenter.view().set_progress(100, &message);
        self.presenter.log(message, Severity::Success);
        self.notify(
            format!("Crawling complete! {collected_count} items collected."),
            NotificationKind::Success,
        );

        let filename = filename.filter(|name| !name.trim().is_empty());
        if let (true, Some(filename)) = (download_ready, filename) {
            match download_url(&self.ctx.settings.server_url, file_path.as_deref()) {
                Ok(url) => {
                    let results = ResultsView::new(filename, collected_count, url.to_string());
                    self.presenter.view().show_results(&results);
                    self.results = Some(results);
                }
                Err(err) => warn!(error = %err, "cannot build download url for results"),
            }
        }

        self.progress_hide.arm(
            self.ctx.settings.timings.progress_hide_delay,
            self.ctx.sender(),
        );
    }

    fn start_job(&mut self, raw_exam_id: &str, format: FileFormat) {
        if self.job == JobState::Running {
            debug!("start ignored: a crawl is already running");
            return;
        }
        let exam_id = match ExamId::parse(raw_exam_id) {
            Ok(exam_id) => exam_id,
            Err(err) => {
                debug!(error = %err, "start rejected: invalid exam id");
                self.notify(INVALID_EXAM_ID, NotificationKind::Error);
                return;
            }
        };
        if !self.connection.is_connected() {
            self.notify(CONNECTION_REQUIRED, NotificationKind::Warning);
            return;
        }

        self.set_job(JobState::Running);
        self.show_progress();
        self.presenter.view().set_progress(0, PREPARING);

        info!(exam_id = %exam_id, format = %format, "starting crawl");
        let request = StartCrawlRequest {
            exam_id,
            file_format: format,
        };
        let api = Arc::clone(&self.ctx.api);
        self.spawn_request(async move { ApiOutcome::Started(api.start_crawling(&request).await) });
    }

    fn on_started(&mut self, result: Result<StartCrawlResponse, ClientError>) {
        match result {
            Ok(response) => {
                info!(session_id = %response.session_id, "crawl started");
                self.presenter.log(
                    format!("Crawling started (session ID: {}).", response.session_id),
                    Severity::Success,
                );
                self.session_id = Some(response.session_id);
            }
            Err(err) => {
                self.report_failure("Failed to start crawling", &err);
                self.set_job(JobState::Idle);
                self.hide_progress();
            }
        }
    }

    fn stop_job(&mut self) {
        if !self.connection.is_connected() {
            self.notify(CONNECTION_REQUIRED, NotificationKind::Warning);
            return;
        }
        info!("requesting crawl stop");
        let api = Arc::clone(&self.ctx.api);
        self.spawn_request(async move { ApiOutcome::Stopped(api.stop_crawling().await) });
    }

    /// The job goes idle only once the `stopped` event arrives.
    fn on_stop_requested(&mut self, result: Result<StopCrawlResponse, ClientError>) {
        match result {
            Ok(response) => {
                self.presenter.log(response.message.clone(), Severity::Warning);
                self.notify(response.message, NotificationKind::Warning);
            }
            Err(err) => self.report_failure("Failed to stop crawling", &err),
        }
    }

    fn on_status(&mut self, result: Result<StatusResponse, ClientError>) {
        match result {
            Ok(status) => {
                self.presenter
                    .log(format!("Server status: {}", describe_status(&status)), Severity::System);
                // A terminal event may have been missed while the stream was down.
                if !status.is_running && self.job == JobState::Running {
                    info!("server reports no running crawl; returning to idle");
                    self.set_job(JobState::Idle);
                    self.hide_progress();
                    self.presenter.log(SERVER_IDLE, Severity::Warning);
                }
            }
            Err(err) => self.report_failure("Failed to fetch server status", &err),
        }
    }

    fn on_server_logs(&mut self, result: Result<LogsResponse, ClientError>) {
        match result {
            Ok(response) if response.logs.is_empty() => {
                self.presenter.log("No server log entries.", Severity::System);
            }
            Ok(response) => {
                for line in response.logs {
                    self.presenter.log(line, Severity::Info);
                }
            }
            Err(err) => self.report_failure("Failed to fetch server logs", &err),
        }
    }

    fn download_results(&mut self) {
        let Some(results) = &self.results else {
            self.notify(NO_RESULTS, NotificationKind::Warning);
            return;
        };
        let url = results.download_url.clone();
        let target = self
            .ctx
            .settings
            .download_dir
            .join(safe_file_name(&results.filename));
        info!(url = %url, target = %target.display(), "downloading results");
        let api = Arc::clone(&self.ctx.api);
        self.spawn_request(async move {
            ApiOutcome::Downloaded(save_download(api.as_ref(), &url, target).await)
        });
    }

    fn report_failure(&mut self, action: &str, err: &ClientError) {
        let detail = err.to_string();
        warn!(action, error = %detail, "request failed");
        self.presenter
            .log(format!("{action}: {detail}"), Severity::Error);
        self.notify(detail, NotificationKind::Error);
    }

    fn set_job(&mut self, state: JobState) {
        self.job = state;
        self.presenter.view().job_state_changed(state);
    }

    fn show_progress(&mut self) {
        self.progress_hide.cancel();
        self.presenter.view().show_progress();
        self.results = None;
        self.presenter.view().hide_results();
    }

    fn hide_progress(&mut self) {
        self.progress_hide.cancel();
        self.presenter.view().hide_progress();
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.presenter.notify(message, kind, self.ctx.sender());
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = ApiOutcome> + Send + 'static,
    {
        let tx = self.ctx.sender().clone();
        tokio::spawn(async move {
            let _ = tx.send(ControllerMsg::Api(request.await));
        });
    }

    fn shutdown(&mut self) {
        self.connection.shutdown();
        self.presenter.shutdown();
        self.progress_hide.cancel();
        self.shut_down = true;
        info!("session controller stopped");
    }
}

/// Rounded percentage for a progress fraction; out-of-range input is clamped.
fn progress_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn describe_status(status: &StatusResponse) -> String {
    let state = if status.is_running { "running" } else { "idle" };
    let exam = status.current_exam_id.as_deref().unwrap_or("-");
    let session = status
        .session_id
        .as_ref()
        .map(|id| id.0.as_str())
        .unwrap_or("-");
    format!(
        "{state}, exam {exam}, {} items collected, session {session}",
        status.collected_count
    )
}

/// Final path component only, so a server-supplied name cannot escape the download dir.
fn safe_file_name(filename: &str) -> PathBuf {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULT_FILENAME))
}

async fn save_download(api: &dyn JobApi, url: &str, target: PathBuf) -> Result<PathBuf, ClientError> {
    let bytes = api.download(url).await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ClientError::Io {
                path: parent.display().to_string(),
                source,
            })?;
    }
    tokio::fs::write(&target, bytes)
        .await
        .map_err(|source| ClientError::Io {
            path: target.display().to_string(),
            source,
        })?;
    Ok(target)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
