use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::events::{ControllerMsg, TimerKind};

struct ScheduledTimer {
    token: u64,
    handle: JoinHandle<()>,
}

/// Holds at most one pending timer of a given kind.
///
/// Arming replaces (and aborts) the previous timer. A fire message that was
/// already queued when its timer got replaced carries a stale token and is
/// rejected by [`TimerSlot::fire`].
pub(crate) struct TimerSlot {
    kind: TimerKind,
    active: Option<ScheduledTimer>,
    next_token: u64,
}

impl TimerSlot {
    pub(crate) fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            active: None,
            next_token: 0,
        }
    }

    pub(crate) fn arm(&mut self, delay: Duration, tx: &UnboundedSender<ControllerMsg>) {
        self.cancel();
        self.next_token += 1;
        let token = self.next_token;
        let kind = self.kind;
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerMsg::Timer { kind, token });
        });
        self.active = Some(ScheduledTimer { token, handle });
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(timer) = self.active.take() {
            timer.handle.abort();
        }
    }

    /// Consumes the pending timer if `token` identifies it.
    pub(crate) fn fire(&mut self, token: u64) -> bool {
        match &self.active {
            Some(timer) if timer.token == token => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub(crate) fn pending_token(&self) -> Option<u64> {
        self.active.as_ref().map(|timer| timer.token)
    }
}
