use crate::bus::resource::ResourceId;
use crate::types::{DeviceId, Motor, PixelFormat, Size2, SystemCursor, Vector2};
use std::fmt;

/// Request from the game thread, executed for effect on the native-owning thread
///
/// Commands are plain values: once built they are only read.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    StartDeviceDiscovery,
    StopDeviceDiscovery,
    SetAbsoluteDpadValues {
        device: DeviceId,
        enabled: bool,
    },
    SetPlayerIndex {
        device: DeviceId,
        player_index: i32,
    },
    SetVibration {
        device: DeviceId,
        motor: Motor,
        speed: f32,
    },
    SetPosition {
        device: DeviceId,
        position: Vector2,
    },
    InitCursor {
        resource: ResourceId,
        source: CursorSource,
    },
    DestroyCursor {
        resource: ResourceId,
    },
    SetCursor {
        device: DeviceId,
        resource: ResourceId,
    },
    SetCursorVisible {
        device: DeviceId,
        visible: bool,
    },
    SetCursorLocked {
        device: DeviceId,
        locked: bool,
    },
    ShowVirtualKeyboard,
    HideVirtualKeyboard,
}

impl Command {
    /// Target device, [`DeviceId::GLOBAL`] for commands without one
    pub fn device(&self) -> DeviceId {
        match self {
            Command::SetAbsoluteDpadValues { device, .. }
            | Command::SetPlayerIndex { device, .. }
            | Command::SetVibration { device, .. }
            | Command::SetPosition { device, .. }
            | Command::SetCursor { device, .. }
            | Command::SetCursorVisible { device, .. }
            | Command::SetCursorLocked { device, .. } => *device,
            Command::StartDeviceDiscovery
            | Command::StopDeviceDiscovery
            | Command::InitCursor { .. }
            | Command::DestroyCursor { .. }
            | Command::ShowVirtualKeyboard
            | Command::HideVirtualKeyboard => DeviceId::GLOBAL,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::StartDeviceDiscovery => "start-device-discovery",
            Command::StopDeviceDiscovery => "stop-device-discovery",
            Command::SetAbsoluteDpadValues { .. } => "set-absolute-dpad-values",
            Command::SetPlayerIndex { .. } => "set-player-index",
            Command::SetVibration { .. } => "set-vibration",
            Command::SetPosition { .. } => "set-position",
            Command::InitCursor { .. } => "init-cursor",
            Command::DestroyCursor { .. } => "destroy-cursor",
            Command::SetCursor { .. } => "set-cursor",
            Command::SetCursorVisible { .. } => "set-cursor-visible",
            Command::SetCursorLocked { .. } => "set-cursor-locked",
            Command::ShowVirtualKeyboard => "show-virtual-keyboard",
            Command::HideVirtualKeyboard => "hide-virtual-keyboard",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let device = self.device();
        if device.is_global() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} ({})", self.name(), device)
        }
    }
}

/// What a native cursor is built from
#[derive(Clone, Debug, PartialEq)]
pub enum CursorSource {
    System(SystemCursor),
    Bitmap(CursorBitmap),
}

/// Premultiplied-alpha pixel data for a custom cursor
#[derive(Clone, Debug, PartialEq)]
pub struct CursorBitmap {
    pub data: Vec<u8>,
    pub size: Size2,
    pub pixel_format: PixelFormat,
    pub hot_spot: Vector2,
}
