use crate::bus::{Command, CommandExecutor};
use crate::controller::dispatch::{ApplicationEvent, EventDispatcher};
use crate::types::{DeviceId, GamepadButton, Motor};
use std::fmt;
use std::sync::Arc;

/// Last reported state of one logical button; `value` is in `0.0..=1.0`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ButtonState {
    pub pressed: bool,
    pub value: f32,
}

pub struct Gamepad {
    id: DeviceId,
    commands: Arc<dyn CommandExecutor>,
    buttons: [ButtonState; GamepadButton::COUNT],
    player_index: i32,
    vibration: [f32; Motor::COUNT],
    absolute_dpad_values: bool,
}

impl Gamepad {
    pub(crate) fn new(id: DeviceId, commands: Arc<dyn CommandExecutor>) -> Self {
        Self {
            id,
            commands,
            buttons: [ButtonState::default(); GamepadButton::COUNT],
            player_index: -1,
            vibration: [0.0; Motor::COUNT],
            absolute_dpad_values: false,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn button_state(&self, button: GamepadButton) -> ButtonState {
        self.buttons[button.index()]
    }

    pub fn is_button_pressed(&self, button: GamepadButton) -> bool {
        self.buttons[button.index()].pressed
    }

    /// -1 until assigned
    pub fn player_index(&self) -> i32 {
        self.player_index
    }

    pub fn vibration(&self, motor: Motor) -> f32 {
        self.vibration[motor.index()]
    }

    pub fn absolute_dpad_values(&self) -> bool {
        self.absolute_dpad_values
    }

    /// Drives the player indicator lights where the hardware has them
    pub fn set_player_index(&mut self, player_index: i32) {
        self.player_index = player_index;
        self.commands
            .execute_on_owning_thread(Command::SetPlayerIndex {
                device: self.id,
                player_index,
            });
    }

    /// `Motor::All` sets every motor
    pub fn set_vibration(&mut self, motor: Motor, speed: f32) {
        let speed = speed.clamp(0.0, 1.0);
        match motor {
            Motor::All => self.vibration = [speed; Motor::COUNT],
            _ => self.vibration[motor.index()] = speed,
        }
        self.commands
            .execute_on_owning_thread(Command::SetVibration {
                device: self.id,
                motor,
                speed,
            });
    }

    /// Report the dpad as four independent buttons instead of resolving
    /// opposing directions
    pub fn set_absolute_dpad_values(&mut self, enabled: bool) {
        self.absolute_dpad_values = enabled;
        self.commands
            .execute_on_owning_thread(Command::SetAbsoluteDpadValues {
                device: self.id,
                enabled,
            });
    }

    pub(crate) fn handle_button_value_change(
        &mut self,
        button: GamepadButton,
        pressed: bool,
        value: f32,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        let previous = std::mem::replace(
            &mut self.buttons[button.index()],
            ButtonState { pressed, value },
        );

        dispatcher.dispatch(ApplicationEvent::GamepadButtonChange {
            gamepad: self.id,
            button,
            pressed,
            previous_pressed: previous.pressed,
            value,
            previous_value: previous.value,
        })
    }
}

impl fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gamepad")
            .field("id", &self.id)
            .field("player_index", &self.player_index)
            .field("vibration", &self.vibration)
            .field("absolute_dpad_values", &self.absolute_dpad_values)
            .finish_non_exhaustive()
    }
}
