//! Application-facing events and the dispatcher seam
//!
//! Controllers turn drained [`InputEvent`](crate::bus::InputEvent)s into
//! [`ApplicationEvent`]s enriched with the state they track (previous button
//! values, movement differences) and hand them to an [`EventDispatcher`].

use crate::types::{ControllerKind, DeviceId, GamepadButton, Key, MouseButton, Vector2};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ApplicationEvent {
    KeyboardConnect {
        keyboard: DeviceId,
    },
    KeyboardDisconnect {
        keyboard: DeviceId,
    },
    KeyPress {
        keyboard: DeviceId,
        key: Key,
    },
    KeyRelease {
        keyboard: DeviceId,
        key: Key,
    },

    MouseConnect {
        mouse: DeviceId,
    },
    MouseDisconnect {
        mouse: DeviceId,
    },
    MousePress {
        mouse: DeviceId,
        button: MouseButton,
        position: Vector2,
    },
    MouseRelease {
        mouse: DeviceId,
        button: MouseButton,
        position: Vector2,
    },
    MouseScroll {
        mouse: DeviceId,
        scroll: Vector2,
        position: Vector2,
    },
    MouseMove {
        mouse: DeviceId,
        position: Vector2,
        difference: Vector2,
    },
    MouseCursorLockChange {
        mouse: DeviceId,
        locked: bool,
    },

    GamepadConnect {
        gamepad: DeviceId,
    },
    GamepadDisconnect {
        gamepad: DeviceId,
    },
    GamepadButtonChange {
        gamepad: DeviceId,
        button: GamepadButton,
        pressed: bool,
        previous_pressed: bool,
        value: f32,
        previous_value: f32,
    },

    TouchpadConnect {
        touchpad: DeviceId,
        screen: bool,
    },
    TouchpadDisconnect {
        touchpad: DeviceId,
    },
    TouchBegin {
        touchpad: DeviceId,
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
    TouchMove {
        touchpad: DeviceId,
        touch_id: u64,
        position: Vector2,
        difference: Vector2,
        force: f32,
    },
    TouchEnd {
        touchpad: DeviceId,
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
    TouchCancel {
        touchpad: DeviceId,
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
}

impl ApplicationEvent {
    /// Controller the event came from
    pub fn device(&self) -> DeviceId {
        use ApplicationEvent as E;
        match self {
            E::KeyboardConnect { keyboard }
            | E::KeyboardDisconnect { keyboard }
            | E::KeyPress { keyboard, .. }
            | E::KeyRelease { keyboard, .. } => *keyboard,
            E::MouseConnect { mouse }
            | E::MouseDisconnect { mouse }
            | E::MousePress { mouse, .. }
            | E::MouseRelease { mouse, .. }
            | E::MouseScroll { mouse, .. }
            | E::MouseMove { mouse, .. }
            | E::MouseCursorLockChange { mouse, .. } => *mouse,
            E::GamepadConnect { gamepad }
            | E::GamepadDisconnect { gamepad }
            | E::GamepadButtonChange { gamepad, .. } => *gamepad,
            E::TouchpadConnect { touchpad, .. }
            | E::TouchpadDisconnect { touchpad }
            | E::TouchBegin { touchpad, .. }
            | E::TouchMove { touchpad, .. }
            | E::TouchEnd { touchpad, .. }
            | E::TouchCancel { touchpad, .. } => *touchpad,
        }
    }

    pub fn kind(&self) -> ControllerKind {
        use ApplicationEvent as E;
        match self {
            E::KeyboardConnect { .. }
            | E::KeyboardDisconnect { .. }
            | E::KeyPress { .. }
            | E::KeyRelease { .. } => ControllerKind::Keyboard,
            E::MouseConnect { .. }
            | E::MouseDisconnect { .. }
            | E::MousePress { .. }
            | E::MouseRelease { .. }
            | E::MouseScroll { .. }
            | E::MouseMove { .. }
            | E::MouseCursorLockChange { .. } => ControllerKind::Mouse,
            E::GamepadConnect { .. }
            | E::GamepadDisconnect { .. }
            | E::GamepadButtonChange { .. } => ControllerKind::Gamepad,
            E::TouchpadConnect { .. }
            | E::TouchpadDisconnect { .. }
            | E::TouchBegin { .. }
            | E::TouchMove { .. }
            | E::TouchEnd { .. }
            | E::TouchCancel { .. } => ControllerKind::Touchpad,
        }
    }
}

/// Consumer of application events, called synchronously on the game thread.
/// The return value is the event's "handled" result.
pub trait EventDispatcher {
    fn dispatch(&mut self, event: ApplicationEvent) -> bool;
}

impl<F> EventDispatcher for F
where
    F: FnMut(ApplicationEvent) -> bool,
{
    fn dispatch(&mut self, event: ApplicationEvent) -> bool {
        self(event)
    }
}

/// Keeps every dispatched event and reports a fixed result
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub events: Vec<ApplicationEvent>,
    pub handled: bool,
}

impl RecordingDispatcher {
    pub fn handling(handled: bool) -> Self {
        Self {
            events: Vec::new(),
            handled,
        }
    }

    pub fn take(&mut self) -> Vec<ApplicationEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, event: ApplicationEvent) -> bool {
        self.events.push(event);
        self.handled
    }
}
