//! Session controller for the crawl backend: keeps the job event stream
//! connected, turns user intent into HTTP requests and renders pushed events
//! through a [`RenderPort`].

mod connection;
pub mod context;
pub mod controller;
pub mod error;
pub mod events;
pub mod log_buffer;
mod presenter;
pub mod protocol_client;
pub mod settings;
mod timer;
pub mod transport;
pub mod types;
pub mod view;

pub use context::{AppContext, ControllerHandle};
pub use controller::SessionController;
pub use error::ClientError;
pub use events::{ApiOutcome, ControllerMsg, StreamEvent, TimerKind, UserCommand};
pub use log_buffer::LogBuffer;
pub use protocol_client::{HttpJobApi, JobApi};
pub use settings::{ClientSettings, Timings};
pub use transport::{event_stream_url, CloseSignal, FrameStream, StreamConnector, WsConnector};
pub use types::{
    ConnectionState, ControllerSnapshot, FileIcon, JobState, LogEntry, Notification,
    NotificationKind, ResultsView, Severity,
};
pub use view::RenderPort;
