//! The two one-way pipes between the native-owning thread and the game thread
//!
//! ```text
//! native thread ──[InputEvent + Completion]──► EventQueue ──► update() (game thread)
//! game thread   ──[Command]──► CommandExecutor ──► native thread
//! ```
//!
//! Posting an event never blocks on game logic: it takes the queue mutex only long
//! enough to push. The game thread swaps the whole queue out in one step, so events
//! posted while a batch is being processed wait for the next tick.

use crate::bus::command::Command;
use crate::bus::event::InputEvent;
use crate::bus::signal::{completion_pair, Completion, CompletionSignal};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{trace, warn};

pub(crate) type PendingEvent = (InputEvent, Completion);

type EventQueue = Arc<Mutex<VecDeque<PendingEvent>>>;

pub(crate) fn event_channel(backlog_warning: usize) -> (EventSender, EventReceiver) {
    let queue: EventQueue = Arc::new(Mutex::new(VecDeque::new()));
    (
        EventSender {
            queue: queue.clone(),
            backlog_warning,
        },
        EventReceiver { queue },
    )
}

/// Native-side posting handle, cloned into every device
#[derive(Clone, Debug)]
pub struct EventSender {
    queue: EventQueue,
    backlog_warning: usize,
}

impl EventSender {
    /// Enqueues the event and returns its unfulfilled completion signal
    pub fn send(&self, event: InputEvent) -> CompletionSignal {
        let (completion, signal) = completion_pair();
        let name = event.kind.name();
        let device = event.device;

        let backlog = {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.push_back((event, completion));
            queue.len()
        };

        trace!("Posted {} from {} (queue length {})", name, device, backlog);
        if backlog == self.backlog_warning {
            warn!(
                "Input event backlog reached {} events; is the game loop calling update()?",
                backlog
            );
        }

        signal
    }
}

/// Game-side draining handle
#[derive(Debug)]
pub struct EventReceiver {
    queue: EventQueue,
}

impl EventReceiver {
    /// Takes everything queued at call time, in arrival order
    pub(crate) fn drain(&self) -> VecDeque<PendingEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Hops a command onto the thread that owns native input resources
///
/// Implementations must run commands in submission order, one at a time. The
/// built-in [`CommandSender`] queues them for
/// [`InputThread`](crate::native::InputThread); a host engine can supply its own
/// main-thread dispatcher instead.
pub trait CommandExecutor: Send + Sync {
    fn execute_on_owning_thread(&self, command: Command);
}

#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandExecutor for CommandSender {
    fn execute_on_owning_thread(&self, command: Command) {
        trace!("Queueing command {}", command);
        if let Err(e) = self.tx.send(command) {
            warn!("Native input thread is gone, dropping command {}", e.0);
        }
    }
}

/// Native-side end of the command pipe
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandReceiver {
    /// Next queued command without blocking
    pub fn try_next(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<Command> {
        self.rx.recv().await
    }
}

pub(crate) fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandReceiver { rx })
}
