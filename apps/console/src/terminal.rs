use std::io::{self, Write};

use client_core::{
    ConnectionState, FileIcon, JobState, LogEntry, Notification, NotificationKind, RenderPort,
    ResultsView,
};

const BAR_WIDTH: usize = 20;

/// Line-oriented render port; every view update becomes one or more lines.
pub struct TerminalView<W: Write + Send = io::Stdout> {
    out: W,
    progress_visible: bool,
}

impl TerminalView {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            progress_visible: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A closed stdout is not worth crashing the controller over.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn entry(&mut self, entry: &LogEntry) {
        let line = format!(
            "{} [{}] {}",
            entry.recorded_at.format("%H:%M:%S"),
            entry.severity,
            entry.text
        );
        self.line(&line);
    }
}

pub(crate) fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn notification_tag(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "success",
        NotificationKind::Warning => "warning",
        NotificationKind::Error => "error",
    }
}

fn icon_tag(icon: FileIcon) -> &'static str {
    match icon {
        FileIcon::Csv => "csv",
        FileIcon::Excel => "excel",
        FileIcon::Code => "code",
        FileIcon::Generic => "file",
    }
}

impl<W: Write + Send> RenderPort for TerminalView<W> {
    fn connection_changed(&mut self, state: ConnectionState) {
        let label = match state {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        };
        self.line(&format!("== server: {label}"));
    }

    fn job_state_changed(&mut self, state: JobState) {
        let label = match state {
            JobState::Idle => "idle (start enabled, stop disabled)",
            JobState::Running => "running (start disabled, stop enabled)",
        };
        self.line(&format!("== job: {label}"));
    }

    fn show_progress(&mut self) {
        self.progress_visible = true;
    }

    fn hide_progress(&mut self) {
        if self.progress_visible {
            self.progress_visible = false;
            self.line("== progress hidden");
        }
    }

    fn set_progress(&mut self, percent: u8, message: &str) {
        let line = format!("{} {percent:>3}% {message}", progress_bar(percent));
        self.line(&line);
    }

    fn set_status_message(&mut self, message: &str) {
        self.line(&format!("== status: {message}"));
    }

    fn show_results(&mut self, results: &ResultsView) {
        let line = format!(
            "== results: {} ({}, {}) {} items, type `download` or fetch {}",
            results.filename,
            results.format_label,
            icon_tag(results.icon),
            results.collected_count,
            results.download_url
        );
        self.line(&line);
    }

    fn hide_results(&mut self) {}

    fn log_appended(&mut self, entry: &LogEntry) {
        self.entry(entry);
    }

    // Terminal scrollback keeps old lines; nothing to remove.
    fn log_evicted(&mut self, _entry: &LogEntry) {}

    fn logs_reset(&mut self, placeholder: &LogEntry) {
        self.line("----------------------------------------");
        self.entry(placeholder);
    }

    fn show_notification(&mut self, notification: &Notification) {
        let line = format!(
            ">> {}: {}",
            notification_tag(notification.kind),
            notification.message
        );
        self.line(&line);
    }

    fn hide_notification(&mut self) {}

    fn exam_id_flagged(&mut self, flagged: bool) {
        if flagged {
            self.line("!! exam id must contain only digits");
        } else {
            self.line("== exam id ok");
        }
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
