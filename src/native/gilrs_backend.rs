//! Gamepad backend on top of gilrs
//!
//! Every gilrs gamepad becomes one registry gamepad. Digital and analog buttons
//! go through `ButtonChanged`; each thumbstick axis is split into a pair of
//! directional buttons whose value is the deflection past the deadzone.

use crate::config::NativeSettings;
use crate::error::InputError;
use crate::native::backend::NativeBackend;
use crate::native::device::GamepadDevice;
use crate::native::registry::DeviceRegistry;
use crate::types::{DeviceId, GamepadButton, Motor};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Thumb direction values at or above this count as pressed
const THUMB_PRESS_THRESHOLD: f32 = 0.5;

pub struct GilrsBackend {
    gilrs: Gilrs,
    gamepads: HashMap<GamepadId, DeviceId>,
    // last reported value per directional thumb button
    thumb_values: HashMap<(DeviceId, GamepadButton), f32>,
    deadzone: f32,
}

impl GilrsBackend {
    pub fn create(settings: &NativeSettings) -> Result<Self, InputError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::Initialization(e.to_string()));
            }
        };

        Ok(Self {
            gilrs,
            gamepads: HashMap::new(),
            thumb_values: HashMap::new(),
            deadzone: settings.joystick_deadzone,
        })
    }

    fn connect(&mut self, gamepad: GamepadId, registry: &mut DeviceRegistry) {
        if self.gamepads.contains_key(&gamepad) {
            return;
        }
        let name = self.gilrs.gamepad(gamepad).name().to_string();
        let id = registry.add_gamepad();
        info!("Gamepad {} ({}) registered as {}", name, gamepad, id);
        self.gamepads.insert(gamepad, id);
    }

    fn disconnect(&mut self, gamepad: GamepadId, registry: &mut DeviceRegistry) {
        let Some(id) = self.gamepads.remove(&gamepad) else {
            return;
        };
        self.thumb_values.retain(|(device, _), _| *device != id);
        if let Some(signal) = registry.remove_device(id) {
            signal.ignore();
        }
    }

    fn report_thumb(&mut self, device: &GamepadDevice, button: GamepadButton, value: f32) {
        let last = self
            .thumb_values
            .insert((device.id(), button), value)
            .unwrap_or(0.0);
        if last != value {
            device
                .handle_button_value_change(button, value >= THUMB_PRESS_THRESHOLD, value)
                .ignore();
        }
    }
}

impl NativeBackend for GilrsBackend {
    fn name(&self) -> &str {
        "gilrs"
    }

    fn discover(&mut self, registry: &mut DeviceRegistry) -> Result<(), InputError> {
        let found: Vec<GamepadId> = self
            .gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, _)| id)
            .collect();

        if found.is_empty() {
            debug!("No gamepad connected");
        }
        for gamepad in found {
            self.connect(gamepad, registry);
        }

        if registry.is_discovering() {
            registry.complete_discovery().ignore();
        }
        Ok(())
    }

    fn poll(&mut self, registry: &mut DeviceRegistry) -> Result<(), InputError> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => self.connect(id, registry),
                EventType::Disconnected => {
                    warn!("Gamepad {} disconnected", id);
                    self.disconnect(id, registry);
                }
                EventType::ButtonChanged(button, value, _) => {
                    let Some(mapped) = map_button(button) else {
                        debug!("Ignoring unmapped button: {:?}", button);
                        continue;
                    };
                    let Some(device) = self.gamepads.get(&id).and_then(|id| registry.gamepad(*id))
                    else {
                        continue;
                    };
                    let pressed = self.gilrs.gamepad(id).is_pressed(button);
                    device
                        .handle_button_value_change(mapped, pressed, value)
                        .ignore();
                }
                EventType::AxisChanged(axis, value, _) => {
                    let Some((negative, positive)) = split_axis(axis) else {
                        debug!("Ignoring unsupported axis: {:?}", axis);
                        continue;
                    };
                    let Some(device) = self.gamepads.get(&id).and_then(|id| registry.gamepad(*id))
                    else {
                        continue;
                    };
                    let value = apply_deadzone(value, self.deadzone);
                    self.report_thumb(device, negative, (-value).max(0.0));
                    self.report_thumb(device, positive, value.max(0.0));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn set_vibration(
        &mut self,
        gamepad: &GamepadDevice,
        motor: Motor,
        speed: f32,
    ) -> Result<(), InputError> {
        // gilrs force feedback needs per-device effects; not wired up
        debug!(
            "Ignoring vibration {:?} = {:.2} for {}",
            motor,
            speed,
            gamepad.id()
        );
        Ok(())
    }
}

fn map_button(button: Button) -> Option<GamepadButton> {
    match button {
        Button::South => Some(GamepadButton::FaceBottom),
        Button::East => Some(GamepadButton::FaceRight),
        Button::West => Some(GamepadButton::FaceLeft),
        Button::North => Some(GamepadButton::FaceTop),
        Button::LeftTrigger => Some(GamepadButton::LeftShoulder),
        Button::LeftTrigger2 => Some(GamepadButton::LeftTrigger),
        Button::RightTrigger => Some(GamepadButton::RightShoulder),
        Button::RightTrigger2 => Some(GamepadButton::RightTrigger),
        Button::LeftThumb => Some(GamepadButton::LeftThumb),
        Button::RightThumb => Some(GamepadButton::RightThumb),
        Button::Start => Some(GamepadButton::Start),
        Button::Select => Some(GamepadButton::Back),
        Button::Mode => Some(GamepadButton::Pause),
        Button::DPadUp => Some(GamepadButton::DPadUp),
        Button::DPadDown => Some(GamepadButton::DPadDown),
        Button::DPadLeft => Some(GamepadButton::DPadLeft),
        Button::DPadRight => Some(GamepadButton::DPadRight),
        _ => None,
    }
}

/// (negative direction, positive direction); gilrs reports Y up as positive
fn split_axis(axis: Axis) -> Option<(GamepadButton, GamepadButton)> {
    match axis {
        Axis::LeftStickX => Some((GamepadButton::LeftThumbLeft, GamepadButton::LeftThumbRight)),
        Axis::LeftStickY => Some((GamepadButton::LeftThumbDown, GamepadButton::LeftThumbUp)),
        Axis::RightStickX => Some((
            GamepadButton::RightThumbLeft,
            GamepadButton::RightThumbRight,
        )),
        Axis::RightStickY => Some((GamepadButton::RightThumbDown, GamepadButton::RightThumbUp)),
        _ => None,
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // rescale to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
