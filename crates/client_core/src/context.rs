use std::sync::Arc;

use shared::domain::FileFormat;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    events::{ControllerMsg, UserCommand},
    protocol_client::{HttpJobApi, JobApi},
    settings::ClientSettings,
    transport::{StreamConnector, WsConnector},
};

/// Everything the controller needs from the outside, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<ClientSettings>,
    pub api: Arc<dyn JobApi>,
    pub connector: Arc<dyn StreamConnector>,
    events: UnboundedSender<ControllerMsg>,
}

impl AppContext {
    /// Returns the context and the receiving end of the controller queue.
    pub fn new(
        settings: ClientSettings,
        api: Arc<dyn JobApi>,
        connector: Arc<dyn StreamConnector>,
    ) -> (Self, UnboundedReceiver<ControllerMsg>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                settings: Arc::new(settings),
                api,
                connector,
                events,
            },
            rx,
        )
    }

    /// Context wired to the real backend over HTTP and WebSocket.
    pub fn with_backend(settings: ClientSettings) -> (Self, UnboundedReceiver<ControllerMsg>) {
        let api = Arc::new(HttpJobApi::new(settings.server_url.clone()));
        Self::new(settings, api, Arc::new(WsConnector))
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.events.clone(),
        }
    }

    pub(crate) fn sender(&self) -> &UnboundedSender<ControllerMsg> {
        &self.events
    }
}

/// Cloneable front-end handle for queueing user commands.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: UnboundedSender<ControllerMsg>,
}

impl ControllerHandle {
    /// Queues `command`; false once the controller has gone away.
    pub fn send(&self, command: UserCommand) -> bool {
        self.tx.send(ControllerMsg::Command(command)).is_ok()
    }

    pub fn start(&self, exam_id: impl Into<String>, format: FileFormat) -> bool {
        self.send(UserCommand::Start {
            exam_id: exam_id.into(),
            format,
        })
    }

    pub fn shutdown(&self) -> bool {
        self.send(UserCommand::Shutdown)
    }
}
