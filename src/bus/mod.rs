//! Transport between the native-owning thread and the game thread
//!
//! [`connect`] builds one matched pair of endpoints:
//!
//! - [`NativeEndpoint`] goes to the thread that owns OS input handles
//!   (see [`crate::native::InputThread`]).
//! - [`GameEndpoint`] goes to the game-update thread
//!   (see [`crate::controller::ControllerManager`]).

pub mod channel;
pub mod command;
pub mod event;
pub mod resource;
pub mod signal;

pub use channel::{CommandExecutor, CommandReceiver, CommandSender, EventReceiver, EventSender};
pub use command::{Command, CursorBitmap, CursorSource};
pub use event::{InputEvent, InputEventKind};
pub use resource::{ResourceId, ResourceIdAllocator, ResourceIds};
pub use signal::{Completion, CompletionSignal};

use crate::config::EventSettings;
use tracing::debug;

/// Game-thread side of the bus
#[derive(Debug)]
pub struct GameEndpoint {
    pub events: EventReceiver,
    pub commands: CommandSender,
    pub resource_ids: ResourceIds,
}

/// Native-thread side of the bus
#[derive(Debug)]
pub struct NativeEndpoint {
    pub events: EventSender,
    pub commands: CommandReceiver,
    pub resource_ids: ResourceIds,
}

pub fn connect(settings: &EventSettings) -> (GameEndpoint, NativeEndpoint) {
    let (event_sender, event_receiver) = channel::event_channel(settings.backlog_warning);
    let (command_sender, command_receiver) = channel::command_channel();
    let resource_ids = ResourceIds::new();
    debug!(
        "Created input bus (backlog warning at {} events)",
        settings.backlog_warning
    );

    (
        GameEndpoint {
            events: event_receiver,
            commands: command_sender,
            resource_ids: resource_ids.clone(),
        },
        NativeEndpoint {
            events: event_sender,
            commands: command_receiver,
            resource_ids,
        },
    )
}
