//! Event stream lifecycle: one tracked connection attempt at a time, plus a
//! single reconnect timer while disconnected.

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::{
    sync::{mpsc::UnboundedSender, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    events::{ControllerMsg, StreamEvent, TimerKind},
    timer::TimerSlot,
    transport::{CloseSignal, StreamConnector},
    types::ConnectionState,
};

/// How long shutdown waits for the close handshake before abandoning the socket.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

pub(crate) struct ConnectionManager {
    connector: Arc<dyn StreamConnector>,
    url: Url,
    state: ConnectionState,
    /// Bumped for every attempt; events tagged with an older value are stale.
    generation: u64,
    closed_generation: Option<u64>,
    task: Option<JoinHandle<()>>,
    close: Option<oneshot::Sender<()>>,
    /// Attempt told to close at shutdown, still finishing its handshake.
    closing: Option<JoinHandle<()>>,
    reconnect: TimerSlot,
    reconnect_delay: Duration,
}

impl ConnectionManager {
    pub(crate) fn new(
        connector: Arc<dyn StreamConnector>,
        url: Url,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            connector,
            url,
            state: ConnectionState::Disconnected,
            generation: 0,
            closed_generation: None,
            task: None,
            close: None,
            closing: None,
            reconnect: TimerSlot::new(TimerKind::Reconnect),
            reconnect_delay,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub(crate) fn reconnect_pending(&self) -> bool {
        self.reconnect.is_armed()
    }

    /// Replaces any previous attempt with a fresh one. A pending reconnect is
    /// dropped; if this attempt fails, its close arms a new one.
    pub(crate) fn connect(&mut self, tx: &UnboundedSender<ControllerMsg>) {
        self.reconnect.cancel();
        // The replaced attempt closes on its own; the generation bump makes its events stale.
        drop(self.request_close());
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
        info!(url = %self.url, generation = self.generation, "event stream: connecting");
        let (close, signal) = oneshot::channel();
        self.close = Some(close);
        self.task = Some(spawn_connection(
            Arc::clone(&self.connector),
            self.url.clone(),
            signal,
            self.generation,
            tx.clone(),
        ));
    }

    /// Returns false for events from a replaced attempt.
    pub(crate) fn mark_open(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "event stream: stale open ignored");
            return false;
        }
        self.state = ConnectionState::Connected;
        self.reconnect.cancel();
        true
    }

    /// Returns false for stale attempts and for repeated closes of the same attempt.
    pub(crate) fn mark_lost(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.closed_generation == Some(generation) {
            return false;
        }
        self.closed_generation = Some(generation);
        self.state = ConnectionState::Disconnected;
        self.task = None;
        self.close = None;
        true
    }

    /// Arms the reconnect timer unless connected or already armed.
    pub(crate) fn schedule_reconnect(&mut self, tx: &UnboundedSender<ControllerMsg>) -> bool {
        if self.is_connected() || self.reconnect.is_armed() {
            return false;
        }
        self.reconnect.arm(self.reconnect_delay, tx);
        true
    }

    /// Handles a reconnect timer firing; true when a new attempt was started.
    pub(crate) fn reconnect_due(&mut self, token: u64, tx: &UnboundedSender<ControllerMsg>) -> bool {
        if !self.reconnect.fire(token) {
            debug!(token, "event stream: stale reconnect timer ignored");
            return false;
        }
        if self.is_connected() {
            return false;
        }
        self.connect(tx);
        true
    }

    /// Asks the current attempt to close; [`Self::wait_closed`] awaits it.
    pub(crate) fn shutdown(&mut self) {
        self.reconnect.cancel();
        self.closing = self.request_close();
        // Anything still queued from the closing attempt becomes stale.
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
    }

    /// Waits for the close handshake started by [`Self::shutdown`], aborting
    /// the attempt once the grace period runs out.
    pub(crate) async fn wait_closed(&mut self) {
        let Some(mut task) = self.closing.take() else {
            return;
        };
        if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
            warn!("event stream: close handshake timed out");
            task.abort();
        }
    }

    fn request_close(&mut self) -> Option<JoinHandle<()>> {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
        self.task.take()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn reconnect_token(&self) -> Option<u64> {
        self.reconnect.pending_token()
    }
}

/// Drives one connection attempt, reporting every step back to the controller.
/// Always finishes with [`StreamEvent::Closed`], even when the connect fails.
fn spawn_connection(
    connector: Arc<dyn StreamConnector>,
    url: Url,
    close: CloseSignal,
    generation: u64,
    tx: UnboundedSender<ControllerMsg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = |event: StreamEvent| {
            let _ = tx.send(ControllerMsg::Stream { generation, event });
        };

        match connector.connect(&url, close).await {
            Ok(mut frames) => {
                send(StreamEvent::Opened);
                while let Some(frame) = frames.next().await {
                    match frame {
                        Ok(text) => send(StreamEvent::Frame(text)),
                        Err(err) => {
                            warn!(generation, error = %err, "event stream: receive failed");
                            send(StreamEvent::Failed(err.to_string()));
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(generation, error = %err, "event stream: connect failed");
                send(StreamEvent::Failed(err.to_string()));
            }
        }
        send(StreamEvent::Closed);
    })
}
