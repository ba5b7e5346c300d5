//! Render port: the named view updates the controller drives.

use crate::types::{ConnectionState, JobState, LogEntry, Notification, ResultsView};

/// Passive view driven by the session controller.
///
/// Implementations only draw; every decision about what to show is made by the
/// controller, so a recording implementation is enough to test it.
pub trait RenderPort: Send {
    fn connection_changed(&mut self, state: ConnectionState);
    /// Inputs for exam id and format are editable only while idle.
    fn job_state_changed(&mut self, state: JobState);
    fn show_progress(&mut self);
    fn hide_progress(&mut self);
    fn set_progress(&mut self, percent: u8, message: &str);
    fn set_status_message(&mut self, message: &str);
    fn show_results(&mut self, results: &ResultsView);
    fn hide_results(&mut self);
    fn log_appended(&mut self, entry: &LogEntry);
    fn log_evicted(&mut self, entry: &LogEntry);
    fn logs_reset(&mut self, placeholder: &LogEntry);
    fn show_notification(&mut self, notification: &Notification);
    fn hide_notification(&mut self);
    fn exam_id_flagged(&mut self, flagged: bool);
}
