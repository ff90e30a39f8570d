use crate::error::InputError;
use crate::native::device::{GamepadDevice, MouseDevice};
use crate::native::registry::{CursorResource, DeviceRegistry};
use crate::types::{Motor, Vector2};

/// Platform collaborator driven by the native-owning thread
///
/// The [`DeviceRegistry`] decides *whether* a command applies (target still
/// present, cursor resource known) and keeps the bookkeeping; the backend only
/// performs the OS side effect. Every hook defaults to a no-op so a backend
/// implements just what its platform supports.
///
/// An `Err` from a hook is logged by [`InputThread`](crate::native::InputThread)
/// and does not stop later commands.
pub trait NativeBackend {
    fn name(&self) -> &str;

    /// One discovery pass: register newly found hardware with the registry.
    /// Called once at startup (if configured) and on every tick while discovering.
    fn discover(&mut self, _registry: &mut DeviceRegistry) -> Result<(), InputError> {
        Ok(())
    }

    /// Poll hardware and report occurrences through the registry's devices
    fn poll(&mut self, _registry: &mut DeviceRegistry) -> Result<(), InputError> {
        Ok(())
    }

    fn start_discovery(&mut self) -> Result<(), InputError> {
        Ok(())
    }

    fn stop_discovery(&mut self) -> Result<(), InputError> {
        Ok(())
    }

    fn set_absolute_dpad_values(
        &mut self,
        _gamepad: &GamepadDevice,
        _enabled: bool,
    ) -> Result<(), InputError> {
        Ok(())
    }

    fn set_player_index(
        &mut self,
        _gamepad: &GamepadDevice,
        _player_index: i32,
    ) -> Result<(), InputError> {
        Ok(())
    }

    fn set_vibration(
        &mut self,
        _gamepad: &GamepadDevice,
        _motor: Motor,
        _speed: f32,
    ) -> Result<(), InputError> {
        Ok(())
    }

    fn set_mouse_position(
        &mut self,
        _mouse: &MouseDevice,
        _position: Vector2,
    ) -> Result<(), InputError> {
        Ok(())
    }

    fn create_cursor(&mut self, _cursor: &CursorResource) -> Result<(), InputError> {
        Ok(())
    }

    fn destroy_cursor(&mut self, _cursor: &CursorResource) -> Result<(), InputError> {
        Ok(())
    }

    /// Re-applies the mouse's cursor to the OS: hidden, platform default
    /// (`cursor == None`) or a custom resource
    fn update_cursor(
        &mut self,
        _mouse: &MouseDevice,
        _cursor: Option<&CursorResource>,
    ) -> Result<(), InputError> {
        Ok(())
    }

    fn set_cursor_locked(&mut self, _mouse: &MouseDevice, _locked: bool) -> Result<(), InputError> {
        Ok(())
    }

    fn show_virtual_keyboard(&mut self) -> Result<(), InputError> {
        Ok(())
    }

    fn hide_virtual_keyboard(&mut self) -> Result<(), InputError> {
        Ok(())
    }
}

/// Backend with no hardware, for headless hosts
#[derive(Debug, Default)]
pub struct NullBackend;

impl NativeBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }
}
