//! Native-side device identities
//!
//! A device only knows who it is and how to turn a raw hardware occurrence into an
//! [`InputEvent`]. Each `handle_*` method posts one event and hands back its
//! completion signal; native callers usually ignore it.

use crate::bus::{CompletionSignal, EventSender, InputEvent, InputEventKind, ResourceId};
use crate::types::{ControllerKind, DeviceId, GamepadButton, Key, Motor, MouseButton, Vector2};

#[derive(Debug)]
pub enum Device {
    Keyboard(KeyboardDevice),
    Mouse(MouseDevice),
    Gamepad(GamepadDevice),
    Touchpad(TouchpadDevice),
}

impl Device {
    pub fn id(&self) -> DeviceId {
        match self {
            Device::Keyboard(device) => device.id,
            Device::Mouse(device) => device.id,
            Device::Gamepad(device) => device.id,
            Device::Touchpad(device) => device.id,
        }
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Device::Keyboard(_) => ControllerKind::Keyboard,
            Device::Mouse(_) => ControllerKind::Mouse,
            Device::Gamepad(_) => ControllerKind::Gamepad,
            Device::Touchpad(_) => ControllerKind::Touchpad,
        }
    }

    /// Touchpads report whether they are a touch screen; everything else is not
    pub fn is_screen(&self) -> bool {
        matches!(self, Device::Touchpad(touchpad) if touchpad.screen)
    }
}

fn post(events: &EventSender, id: DeviceId, kind: InputEventKind) -> CompletionSignal {
    events.send(InputEvent::new(id, kind))
}

#[derive(Debug)]
pub struct KeyboardDevice {
    id: DeviceId,
    events: EventSender,
}

impl KeyboardDevice {
    pub fn new(id: DeviceId, events: EventSender) -> Self {
        Self { id, events }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn handle_key_press(&self, key: Key) -> CompletionSignal {
        post(&self.events, self.id, InputEventKind::KeyPress { key })
    }

    pub fn handle_key_release(&self, key: Key) -> CompletionSignal {
        post(&self.events, self.id, InputEventKind::KeyRelease { key })
    }
}

/// Mouse identity plus the cursor state the native thread applies to the OS
#[derive(Debug)]
pub struct MouseDevice {
    id: DeviceId,
    events: EventSender,
    position: Vector2,
    cursor: ResourceId,
    cursor_visible: bool,
    cursor_locked: bool,
}

impl MouseDevice {
    pub fn new(id: DeviceId, events: EventSender) -> Self {
        Self {
            id,
            events,
            position: Vector2::ZERO,
            cursor: ResourceId::NONE,
            cursor_visible: true,
            cursor_locked: false,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn handle_button_press(&self, button: MouseButton, position: Vector2) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::MousePress { button, position },
        )
    }

    pub fn handle_button_release(
        &self,
        button: MouseButton,
        position: Vector2,
    ) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::MouseRelease { button, position },
        )
    }

    pub fn handle_move(&self, position: Vector2) -> CompletionSignal {
        post(&self.events, self.id, InputEventKind::MouseMove { position })
    }

    pub fn handle_relative_move(&self, difference: Vector2) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::MouseRelativeMove { difference },
        )
    }

    pub fn handle_scroll(&self, scroll: Vector2, position: Vector2) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::MouseScroll { scroll, position },
        )
    }

    pub fn handle_cursor_lock_change(&self, locked: bool) -> CompletionSignal {
        post(&self.events, self.id, InputEventKind::MouseLockChange { locked })
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    /// Active cursor resource, `ResourceId::NONE` for the platform default
    pub fn cursor(&self) -> ResourceId {
        self.cursor
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    pub(crate) fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    pub(crate) fn set_cursor(&mut self, cursor: ResourceId) {
        self.cursor = cursor;
    }

    pub(crate) fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    pub(crate) fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }
}

#[derive(Debug)]
pub struct GamepadDevice {
    id: DeviceId,
    events: EventSender,
    player_index: i32,
    absolute_dpad_values: bool,
    vibration: [f32; Motor::COUNT],
}

impl GamepadDevice {
    pub fn new(id: DeviceId, events: EventSender) -> Self {
        Self {
            id,
            events,
            player_index: -1,
            absolute_dpad_values: false,
            vibration: [0.0; Motor::COUNT],
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn handle_button_value_change(
        &self,
        button: GamepadButton,
        pressed: bool,
        value: f32,
    ) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::GamepadButtonChange {
                button,
                pressed,
                value,
            },
        )
    }

    pub fn player_index(&self) -> i32 {
        self.player_index
    }

    pub fn absolute_dpad_values(&self) -> bool {
        self.absolute_dpad_values
    }

    pub fn vibration(&self, motor: Motor) -> f32 {
        self.vibration[motor.index()]
    }

    pub(crate) fn set_player_index(&mut self, player_index: i32) {
        self.player_index = player_index;
    }

    pub(crate) fn set_absolute_dpad_values(&mut self, enabled: bool) {
        self.absolute_dpad_values = enabled;
    }

    pub(crate) fn set_vibration(&mut self, motor: Motor, speed: f32) {
        match motor {
            Motor::All => self.vibration = [speed; Motor::COUNT],
            _ => self.vibration[motor.index()] = speed,
        }
    }
}

#[derive(Debug)]
pub struct TouchpadDevice {
    id: DeviceId,
    events: EventSender,
    screen: bool,
}

impl TouchpadDevice {
    pub fn new(id: DeviceId, events: EventSender, screen: bool) -> Self {
        Self { id, events, screen }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn is_screen(&self) -> bool {
        self.screen
    }

    pub fn handle_touch_begin(&self, touch_id: u64, position: Vector2, force: f32) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::TouchBegin {
                touch_id,
                position,
                force,
            },
        )
    }

    pub fn handle_touch_move(&self, touch_id: u64, position: Vector2, force: f32) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::TouchMove {
                touch_id,
                position,
                force,
            },
        )
    }

    pub fn handle_touch_end(&self, touch_id: u64, position: Vector2, force: f32) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::TouchEnd {
                touch_id,
                position,
                force,
            },
        )
    }

    pub fn handle_touch_cancel(&self, touch_id: u64, position: Vector2, force: f32) -> CompletionSignal {
        post(
            &self.events,
            self.id,
            InputEventKind::TouchCancel {
                touch_id,
                position,
                force,
            },
        )
    }
}
