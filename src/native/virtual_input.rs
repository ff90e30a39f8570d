//! In-process input source for demos, tests and headless hosts
//!
//! [`VirtualBackend`] registers one keyboard, mouse, touch screen and gamepad on
//! discovery. Occurrences fed through the cloneable [`VirtualInput`] handle (from
//! any thread) are replayed onto those devices on the next poll.

use crate::error::InputError;
use crate::native::backend::NativeBackend;
use crate::native::device::MouseDevice;
use crate::native::registry::DeviceRegistry;
use crate::types::{DeviceId, GamepadButton, Key, MouseButton, Vector2};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Raw occurrence as a platform would report it
#[derive(Clone, Debug, PartialEq)]
pub enum VirtualOccurrence {
    KeyPress(Key),
    KeyRelease(Key),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
    MouseMove(Vector2),
    MouseRelativeMove(Vector2),
    MouseScroll(Vector2),
    /// `gamepad` is the slot in connection order, starting at 0
    GamepadButton {
        gamepad: usize,
        button: GamepadButton,
        pressed: bool,
        value: f32,
    },
    TouchBegin { touch_id: u64, position: Vector2 },
    TouchMove { touch_id: u64, position: Vector2 },
    TouchEnd { touch_id: u64, position: Vector2 },
    TouchCancel { touch_id: u64, position: Vector2 },
    ConnectGamepad,
    DisconnectGamepad { gamepad: usize },
}

/// Feeding handle for a [`VirtualBackend`]
#[derive(Clone, Debug)]
pub struct VirtualInput {
    tx: mpsc::UnboundedSender<VirtualOccurrence>,
}

impl VirtualInput {
    pub fn feed(&self, occurrence: VirtualOccurrence) {
        if let Err(e) = self.tx.send(occurrence) {
            warn!("Virtual backend is gone, dropping {:?}", e.0);
        }
    }

    pub fn press_key(&self, key: Key) {
        self.feed(VirtualOccurrence::KeyPress(key));
    }

    pub fn release_key(&self, key: Key) {
        self.feed(VirtualOccurrence::KeyRelease(key));
    }

    pub fn tap_key(&self, key: Key) {
        self.press_key(key);
        self.release_key(key);
    }

    pub fn press_mouse_button(&self, button: MouseButton) {
        self.feed(VirtualOccurrence::MousePress(button));
    }

    pub fn release_mouse_button(&self, button: MouseButton) {
        self.feed(VirtualOccurrence::MouseRelease(button));
    }

    pub fn move_mouse(&self, position: Vector2) {
        self.feed(VirtualOccurrence::MouseMove(position));
    }

    pub fn move_mouse_by(&self, difference: Vector2) {
        self.feed(VirtualOccurrence::MouseRelativeMove(difference));
    }

    pub fn scroll(&self, scroll: Vector2) {
        self.feed(VirtualOccurrence::MouseScroll(scroll));
    }

    pub fn press_gamepad_button(&self, gamepad: usize, button: GamepadButton) {
        self.set_gamepad_button(gamepad, button, 1.0);
    }

    pub fn release_gamepad_button(&self, gamepad: usize, button: GamepadButton) {
        self.set_gamepad_button(gamepad, button, 0.0);
    }

    /// Analog value in 0..=1; counts as pressed above one half
    pub fn set_gamepad_button(&self, gamepad: usize, button: GamepadButton, value: f32) {
        self.feed(VirtualOccurrence::GamepadButton {
            gamepad,
            button,
            pressed: value > 0.5,
            value,
        });
    }

    pub fn touch_begin(&self, touch_id: u64, position: Vector2) {
        self.feed(VirtualOccurrence::TouchBegin { touch_id, position });
    }

    pub fn touch_move(&self, touch_id: u64, position: Vector2) {
        self.feed(VirtualOccurrence::TouchMove { touch_id, position });
    }

    pub fn touch_end(&self, touch_id: u64, position: Vector2) {
        self.feed(VirtualOccurrence::TouchEnd { touch_id, position });
    }

    pub fn touch_cancel(&self, touch_id: u64, position: Vector2) {
        self.feed(VirtualOccurrence::TouchCancel { touch_id, position });
    }

    pub fn connect_gamepad(&self) {
        self.feed(VirtualOccurrence::ConnectGamepad);
    }

    pub fn disconnect_gamepad(&self, gamepad: usize) {
        self.feed(VirtualOccurrence::DisconnectGamepad { gamepad });
    }
}

const TOUCH_FORCE: f32 = 1.0;

#[derive(Debug)]
pub struct VirtualBackend {
    rx: mpsc::UnboundedReceiver<VirtualOccurrence>,
    keyboard: Option<DeviceId>,
    mouse: Option<DeviceId>,
    touchpad: Option<DeviceId>,
    gamepads: Vec<DeviceId>,
    mouse_position: Vector2,
    virtual_keyboard_visible: bool,
}

impl VirtualBackend {
    pub fn new() -> (Self, VirtualInput) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                keyboard: None,
                mouse: None,
                touchpad: None,
                gamepads: Vec::new(),
                mouse_position: Vector2::ZERO,
                virtual_keyboard_visible: false,
            },
            VirtualInput { tx },
        )
    }

    pub fn mouse_position(&self) -> Vector2 {
        self.mouse_position
    }

    pub fn is_virtual_keyboard_visible(&self) -> bool {
        self.virtual_keyboard_visible
    }

    fn replay(&mut self, occurrence: VirtualOccurrence, registry: &mut DeviceRegistry) {
        use VirtualOccurrence as O;

        match occurrence {
            O::KeyPress(key) | O::KeyRelease(key) => {
                let Some(keyboard) = self.keyboard.and_then(|id| registry.keyboard(id)) else {
                    debug!("No virtual keyboard for {:?}", occurrence);
                    return;
                };
                let signal = if matches!(occurrence, O::KeyPress(_)) {
                    keyboard.handle_key_press(key)
                } else {
                    keyboard.handle_key_release(key)
                };
                signal.ignore();
            }
            O::MousePress(_)
            | O::MouseRelease(_)
            | O::MouseMove(_)
            | O::MouseRelativeMove(_)
            | O::MouseScroll(_) => {
                let Some(mouse) = self.mouse.and_then(|id| registry.mouse(id)) else {
                    debug!("No virtual mouse for {:?}", occurrence);
                    return;
                };
                let signal = match occurrence {
                    O::MousePress(button) => mouse.handle_button_press(button, self.mouse_position),
                    O::MouseRelease(button) => {
                        mouse.handle_button_release(button, self.mouse_position)
                    }
                    O::MouseMove(position) => {
                        self.mouse_position = position;
                        mouse.handle_move(position)
                    }
                    O::MouseRelativeMove(difference) => {
                        self.mouse_position = self.mouse_position + difference;
                        mouse.handle_relative_move(difference)
                    }
                    O::MouseScroll(scroll) => mouse.handle_scroll(scroll, self.mouse_position),
                    _ => return,
                };
                signal.ignore();
            }
            O::GamepadButton {
                gamepad,
                button,
                pressed,
                value,
            } => {
                let Some(device) = self
                    .gamepads
                    .get(gamepad)
                    .and_then(|id| registry.gamepad(*id))
                else {
                    debug!("No virtual gamepad in slot {}", gamepad);
                    return;
                };
                device
                    .handle_button_value_change(button, pressed, value)
                    .ignore();
            }
            O::TouchBegin { touch_id, position }
            | O::TouchMove { touch_id, position }
            | O::TouchEnd { touch_id, position }
            | O::TouchCancel { touch_id, position } => {
                let Some(touchpad) = self.touchpad.and_then(|id| registry.touchpad(id)) else {
                    debug!("No virtual touch screen for {:?}", occurrence);
                    return;
                };
                let signal = match occurrence {
                    O::TouchBegin { .. } => touchpad.handle_touch_begin(touch_id, position, TOUCH_FORCE),
                    O::TouchMove { .. } => touchpad.handle_touch_move(touch_id, position, TOUCH_FORCE),
                    O::TouchEnd { .. } => touchpad.handle_touch_end(touch_id, position, TOUCH_FORCE),
                    _ => touchpad.handle_touch_cancel(touch_id, position, TOUCH_FORCE),
                };
                signal.ignore();
            }
            O::ConnectGamepad => {
                let id = registry.add_gamepad();
                self.gamepads.push(id);
            }
            O::DisconnectGamepad { gamepad } => {
                if gamepad >= self.gamepads.len() {
                    debug!("No virtual gamepad in slot {}", gamepad);
                    return;
                }
                let id = self.gamepads.remove(gamepad);
                if let Some(signal) = registry.remove_device(id) {
                    signal.ignore();
                }
            }
        }
    }
}

impl NativeBackend for VirtualBackend {
    fn name(&self) -> &str {
        "virtual"
    }

    fn discover(&mut self, registry: &mut DeviceRegistry) -> Result<(), InputError> {
        if self.keyboard.is_none() {
            self.keyboard = Some(registry.add_keyboard());
            self.mouse = Some(registry.add_mouse());
            self.touchpad = Some(registry.add_touchpad(true));
            self.gamepads.push(registry.add_gamepad());
            info!("Registered virtual keyboard, mouse, touch screen and gamepad");
        }

        // nothing left to find after the first pass
        if registry.is_discovering() {
            registry.complete_discovery().ignore();
        }
        Ok(())
    }

    fn poll(&mut self, registry: &mut DeviceRegistry) -> Result<(), InputError> {
        while let Ok(occurrence) = self.rx.try_recv() {
            self.replay(occurrence, registry);
        }
        Ok(())
    }

    fn set_mouse_position(
        &mut self,
        _mouse: &MouseDevice,
        position: Vector2,
    ) -> Result<(), InputError> {
        self.mouse_position = position;
        Ok(())
    }

    fn set_cursor_locked(&mut self, mouse: &MouseDevice, locked: bool) -> Result<(), InputError> {
        // a real platform reports the lock back asynchronously
        mouse.handle_cursor_lock_change(locked).ignore();
        Ok(())
    }

    fn show_virtual_keyboard(&mut self) -> Result<(), InputError> {
        info!("Showing virtual keyboard");
        self.virtual_keyboard_visible = true;
        Ok(())
    }

    fn hide_virtual_keyboard(&mut self) -> Result<(), InputError> {
        info!("Hiding virtual keyboard");
        self.virtual_keyboard_visible = false;
        Ok(())
    }
}
