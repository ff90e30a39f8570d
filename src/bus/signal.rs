//! Single-assignment "was this event handled" signal
//!
//! Every posted event is paired with a [`Completion`] (kept with the event in the
//! queue, consumed on the game thread) and a [`CompletionSignal`] (returned to the
//! poster). `Completion::fulfill` takes `self`, so an event can be answered at most
//! once. If the game side drops the event without answering, the signal resolves
//! to `None`.

use tokio::sync::oneshot;
use tracing::trace;

pub(crate) fn completion_pair() -> (Completion, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, CompletionSignal { rx })
}

/// Game-thread half: answers one event
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<bool>,
}

impl Completion {
    pub fn fulfill(self, handled: bool) {
        if self.tx.send(handled).is_err() {
            trace!("Completion signal was dropped by the poster");
        }
    }
}

/// Poster half: observe the handled flag, or ignore it
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<bool>,
}

impl CompletionSignal {
    /// Fire-and-forget
    pub fn ignore(self) {}

    /// Blocks the calling thread until the game thread processed the event.
    ///
    /// Blocks until the next `ControllerManager::update`; never call this from
    /// the game thread itself or from inside an async runtime.
    pub fn wait(self) -> Option<bool> {
        self.rx.blocking_recv().ok()
    }

    /// The answer if it is already available
    pub fn try_result(&mut self) -> Option<bool> {
        self.rx.try_recv().ok()
    }

    pub async fn handled(self) -> Option<bool> {
        self.rx.await.ok()
    }
}
