use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    events::{ControllerMsg, TimerKind},
    log_buffer::LogBuffer,
    timer::TimerSlot,
    types::{LogEntry, Notification, NotificationKind, Severity},
    view::RenderPort,
};

pub(crate) const LOGS_CLEARED: &str = "Logs cleared.";

/// Owns the render port together with the bounded log and the notification banner.
pub(crate) struct Presenter {
    view: Box<dyn RenderPort>,
    logs: LogBuffer,
    dismiss: TimerSlot,
    notification_ttl: Duration,
}

impl Presenter {
    pub(crate) fn new(
        view: Box<dyn RenderPort>,
        log_capacity: usize,
        notification_ttl: Duration,
    ) -> Self {
        Self {
            view,
            logs: LogBuffer::new(log_capacity),
            dismiss: TimerSlot::new(TimerKind::DismissNotification),
            notification_ttl,
        }
    }

    pub(crate) fn view(&mut self) -> &mut dyn RenderPort {
        self.view.as_mut()
    }

    pub(crate) fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub(crate) fn log(&mut self, text: impl Into<String>, severity: Severity) {
        let entry = LogEntry::new(text, severity);
        let evicted = self.logs.push(entry.clone());
        self.view.log_appended(&entry);
        if let Some(evicted) = evicted {
            self.view.log_evicted(&evicted);
        }
    }

    pub(crate) fn clear_logs(&mut self) {
        let placeholder = LogEntry::new(LOGS_CLEARED, Severity::System);
        self.logs.reset(placeholder.clone());
        self.view.logs_reset(&placeholder);
    }

    /// Shows `message`, replacing the current banner and its dismiss timer.
    pub(crate) fn notify(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        tx: &UnboundedSender<ControllerMsg>,
    ) {
        let notification = Notification {
            message: message.into(),
            kind,
        };
        self.view.show_notification(&notification);
        self.dismiss.arm(self.notification_ttl, tx);
    }

    pub(crate) fn dismiss_due(&mut self, token: u64) {
        if self.dismiss.fire(token) {
            self.view.hide_notification();
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.dismiss.cancel();
    }

    #[cfg(test)]
    pub(crate) fn dismiss_token(&self) -> Option<u64> {
        self.dismiss.pending_token()
    }
}
