use crate::types::{ControllerKind, DeviceId, GamepadButton, Key, MouseButton, Vector2};
use chrono::{DateTime, Local};

/// Occurrence reported by a native device, timestamped at capture
#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    pub device: DeviceId,
    pub timestamp: DateTime<Local>,
    pub kind: InputEventKind,
}

impl InputEvent {
    pub fn new(device: DeviceId, kind: InputEventKind) -> Self {
        Self {
            device,
            timestamp: Local::now(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEventKind {
    DeviceConnect {
        kind: ControllerKind,
        /// Touchpads only: whether touches land on the screen
        screen: bool,
    },
    DeviceDisconnect,
    DeviceDiscoveryComplete,

    GamepadButtonChange {
        button: GamepadButton,
        pressed: bool,
        value: f32,
    },

    KeyPress {
        key: Key,
    },
    KeyRelease {
        key: Key,
    },

    MousePress {
        button: MouseButton,
        position: Vector2,
    },
    MouseRelease {
        button: MouseButton,
        position: Vector2,
    },
    MouseScroll {
        scroll: Vector2,
        position: Vector2,
    },
    MouseMove {
        position: Vector2,
    },
    MouseRelativeMove {
        difference: Vector2,
    },
    MouseLockChange {
        locked: bool,
    },

    TouchBegin {
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
    TouchMove {
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
    TouchEnd {
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
    TouchCancel {
        touch_id: u64,
        position: Vector2,
        force: f32,
    },
}

impl InputEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            InputEventKind::DeviceConnect { .. } => "device-connect",
            InputEventKind::DeviceDisconnect => "device-disconnect",
            InputEventKind::DeviceDiscoveryComplete => "device-discovery-complete",
            InputEventKind::GamepadButtonChange { .. } => "gamepad-button-change",
            InputEventKind::KeyPress { .. } => "key-press",
            InputEventKind::KeyRelease { .. } => "key-release",
            InputEventKind::MousePress { .. } => "mouse-press",
            InputEventKind::MouseRelease { .. } => "mouse-release",
            InputEventKind::MouseScroll { .. } => "mouse-scroll",
            InputEventKind::MouseMove { .. } => "mouse-move",
            InputEventKind::MouseRelativeMove { .. } => "mouse-relative-move",
            InputEventKind::MouseLockChange { .. } => "mouse-lock-change",
            InputEventKind::TouchBegin { .. } => "touch-begin",
            InputEventKind::TouchMove { .. } => "touch-move",
            InputEventKind::TouchEnd { .. } => "touch-end",
            InputEventKind::TouchCancel { .. } => "touch-cancel",
        }
    }
}
