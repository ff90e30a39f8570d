//! Game-thread half of the input system
//!
//! Implements the consuming end of the bus:
//!
//! 1. [`manager`] - drains events once per tick and owns every controller
//! 2. [`keyboard`], [`mouse`], [`gamepad`], [`touchpad`] - per-device state
//! 3. [`dispatch`] - application events and the dispatcher seam
//! 4. [`cursor`] - resource-id-backed cursor handles
//!
//! # Architecture
//!
//! ```text
//! EventReceiver ──► ControllerManager ──► Controller ──► EventDispatcher
//!                                              │
//!                          CommandExecutor ◄───┘ (setters)
//! ```

pub mod cursor;
pub mod dispatch;
pub mod gamepad;
pub mod keyboard;
pub mod manager;
pub mod mouse;
pub mod touchpad;

pub use cursor::Cursor;
pub use dispatch::{ApplicationEvent, EventDispatcher, RecordingDispatcher};
pub use gamepad::{ButtonState, Gamepad};
pub use keyboard::Keyboard;
pub use manager::ControllerManager;
pub use mouse::Mouse;
pub use touchpad::Touchpad;

use crate::bus::InputEventKind;
use crate::types::{ControllerKind, DeviceId};
use tracing::debug;

/// One connected device as seen from the game thread
#[derive(Debug)]
pub enum Controller {
    Keyboard(Keyboard),
    Mouse(Mouse),
    Gamepad(Gamepad),
    Touchpad(Touchpad),
}

impl Controller {
    pub fn id(&self) -> DeviceId {
        match self {
            Controller::Keyboard(keyboard) => keyboard.id(),
            Controller::Mouse(mouse) => mouse.id(),
            Controller::Gamepad(gamepad) => gamepad.id(),
            Controller::Touchpad(touchpad) => touchpad.id(),
        }
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            Controller::Keyboard(_) => ControllerKind::Keyboard,
            Controller::Mouse(_) => ControllerKind::Mouse,
            Controller::Gamepad(_) => ControllerKind::Gamepad,
            Controller::Touchpad(_) => ControllerKind::Touchpad,
        }
    }

    pub fn as_gamepad(&self) -> Option<&Gamepad> {
        match self {
            Controller::Gamepad(gamepad) => Some(gamepad),
            _ => None,
        }
    }

    pub fn as_gamepad_mut(&mut self) -> Option<&mut Gamepad> {
        match self {
            Controller::Gamepad(gamepad) => Some(gamepad),
            _ => None,
        }
    }

    /// Routes a per-device event to the matching `handle_*` method.
    /// Events that do not fit the controller kind are ignored as unhandled.
    pub(crate) fn handle(
        &mut self,
        event: InputEventKind,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        use InputEventKind as K;

        match (self, event) {
            (Controller::Keyboard(keyboard), K::KeyPress { key }) => {
                keyboard.handle_key_press(key, dispatcher)
            }
            (Controller::Keyboard(keyboard), K::KeyRelease { key }) => {
                keyboard.handle_key_release(key, dispatcher)
            }
            (Controller::Mouse(mouse), K::MousePress { button, position }) => {
                mouse.handle_button_press(button, position, dispatcher)
            }
            (Controller::Mouse(mouse), K::MouseRelease { button, position }) => {
                mouse.handle_button_release(button, position, dispatcher)
            }
            (Controller::Mouse(mouse), K::MouseScroll { scroll, position }) => {
                mouse.handle_scroll(scroll, position, dispatcher)
            }
            (Controller::Mouse(mouse), K::MouseMove { position }) => {
                mouse.handle_move(position, dispatcher)
            }
            (Controller::Mouse(mouse), K::MouseRelativeMove { difference }) => {
                mouse.handle_relative_move(difference, dispatcher)
            }
            (Controller::Mouse(mouse), K::MouseLockChange { locked }) => {
                mouse.handle_cursor_lock_change(locked, dispatcher)
            }
            (
                Controller::Gamepad(gamepad),
                K::GamepadButtonChange {
                    button,
                    pressed,
                    value,
                },
            ) => gamepad.handle_button_value_change(button, pressed, value, dispatcher),
            (
                Controller::Touchpad(touchpad),
                K::TouchBegin {
                    touch_id,
                    position,
                    force,
                },
            ) => touchpad.handle_touch_begin(touch_id, position, force, dispatcher),
            (
                Controller::Touchpad(touchpad),
                K::TouchMove {
                    touch_id,
                    position,
                    force,
                },
            ) => touchpad.handle_touch_move(touch_id, position, force, dispatcher),
            (
                Controller::Touchpad(touchpad),
                K::TouchEnd {
                    touch_id,
                    position,
                    force,
                },
            ) => touchpad.handle_touch_end(touch_id, position, force, dispatcher),
            (
                Controller::Touchpad(touchpad),
                K::TouchCancel {
                    touch_id,
                    position,
                    force,
                },
            ) => touchpad.handle_touch_cancel(touch_id, position, force, dispatcher),
            (controller, event) => {
                debug!(
                    "{} {} ignores {}",
                    controller.kind(),
                    controller.id(),
                    event.name()
                );
                false
            }
        }
    }
}
