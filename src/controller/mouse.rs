use crate::bus::{Command, CommandExecutor, ResourceId};
use crate::controller::cursor::{Cursor, CursorShared};
use crate::controller::dispatch::{ApplicationEvent, EventDispatcher};
use crate::types::{DeviceId, MouseButton, Vector2};
use std::fmt;
use std::sync::{Arc, Weak};

/// Game-side mouse
///
/// Setters update local state right away and queue the matching command; the
/// native side may still drop it if the device is gone by then.
pub struct Mouse {
    id: DeviceId,
    commands: Arc<dyn CommandExecutor>,
    position: Vector2,
    buttons: [bool; MouseButton::COUNT],
    cursor_visible: bool,
    cursor_locked: bool,
    cursor: Option<Weak<CursorShared>>,
}

impl Mouse {
    pub(crate) fn new(id: DeviceId, commands: Arc<dyn CommandExecutor>) -> Self {
        Self {
            id,
            commands,
            position: Vector2::ZERO,
            buttons: [false; MouseButton::COUNT],
            cursor_visible: true,
            cursor_locked: false,
            cursor: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Resource id of the selected cursor; `NONE` once that cursor is dropped
    pub fn cursor_resource(&self) -> ResourceId {
        self.cursor
            .as_ref()
            .and_then(Weak::upgrade)
            .map_or(ResourceId::NONE, |shared| shared.resource())
    }

    /// Warps the pointer
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
        self.send(Command::SetPosition {
            device: self.id,
            position,
        });
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
        self.send(Command::SetCursorVisible {
            device: self.id,
            visible,
        });
    }

    /// Requests a lock; the platform confirms with a lock-change event
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
        self.send(Command::SetCursorLocked {
            device: self.id,
            locked,
        });
    }

    /// Selects a custom cursor, or the platform default for `None`
    pub fn set_cursor(&mut self, cursor: Option<&Cursor>) {
        self.cursor = cursor.map(Cursor::downgrade);
        let resource = cursor.map_or(ResourceId::NONE, Cursor::resource);
        self.send(Command::SetCursor {
            device: self.id,
            resource,
        });
    }

    pub(crate) fn handle_button_press(
        &mut self,
        button: MouseButton,
        position: Vector2,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.buttons[button.index()] = true;
        self.position = position;
        dispatcher.dispatch(ApplicationEvent::MousePress {
            mouse: self.id,
            button,
            position,
        })
    }

    pub(crate) fn handle_button_release(
        &mut self,
        button: MouseButton,
        position: Vector2,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.buttons[button.index()] = false;
        self.position = position;
        dispatcher.dispatch(ApplicationEvent::MouseRelease {
            mouse: self.id,
            button,
            position,
        })
    }

    pub(crate) fn handle_scroll(
        &mut self,
        scroll: Vector2,
        position: Vector2,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.position = position;
        dispatcher.dispatch(ApplicationEvent::MouseScroll {
            mouse: self.id,
            scroll,
            position,
        })
    }

    pub(crate) fn handle_move(
        &mut self,
        position: Vector2,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        let difference = position - self.position;
        self.position = position;
        dispatcher.dispatch(ApplicationEvent::MouseMove {
            mouse: self.id,
            position,
            difference,
        })
    }

    /// Locked cursors report raw motion; it still surfaces as an absolute move
    pub(crate) fn handle_relative_move(
        &mut self,
        difference: Vector2,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.position = self.position + difference;
        dispatcher.dispatch(ApplicationEvent::MouseMove {
            mouse: self.id,
            position: self.position,
            difference,
        })
    }

    pub(crate) fn handle_cursor_lock_change(
        &mut self,
        locked: bool,
        dispatcher: &mut dyn EventDispatcher,
    ) -> bool {
        self.cursor_locked = locked;
        dispatcher.dispatch(ApplicationEvent::MouseCursorLockChange {
            mouse: self.id,
            locked,
        })
    }

    fn send(&self, command: Command) {
        self.commands.execute_on_owning_thread(command);
    }
}

impl fmt::Debug for Mouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mouse")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("buttons", &self.buttons)
            .field("cursor_visible", &self.cursor_visible)
            .field("cursor_locked", &self.cursor_locked)
            .field("cursor", &self.cursor_resource())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::channel::command_channel;
    use crate::bus::{CommandReceiver, InputEventKind, ResourceIds};
    use crate::controller::dispatch::RecordingDispatcher;
    use crate::types::SystemCursor;

    fn mouse() -> (Mouse, CommandReceiver, Arc<dyn CommandExecutor>) {
        let (sender, receiver) = command_channel();
        let commands: Arc<dyn CommandExecutor> = Arc::new(sender);
        (Mouse::new(DeviceId::new(2), commands.clone()), receiver, commands)
    }

    #[test]
    fn moves_report_difference_from_last_position() {
        let (mut mouse, _commands, _executor) = mouse();
        let mut dispatcher = RecordingDispatcher::handling(true);

        assert!(mouse.handle_move(Vector2::new(0.5, 0.5), &mut dispatcher));
        mouse.handle_relative_move(Vector2::new(0.25, -0.5), &mut dispatcher);

        assert_eq!(
            dispatcher.take(),
            vec![
                ApplicationEvent::MouseMove {
                    mouse: mouse.id(),
                    position: Vector2::new(0.5, 0.5),
                    difference: Vector2::new(0.5, 0.5),
                },
                ApplicationEvent::MouseMove {
                    mouse: mouse.id(),
                    position: Vector2::new(0.75, 0.0),
                    difference: Vector2::new(0.25, -0.5),
                },
            ]
        );
        assert_eq!(mouse.position(), Vector2::new(0.75, 0.0));
    }

    #[test]
    fn scroll_dispatches_and_moves_the_pointer() {
        let (mouse, _commands, _executor) = mouse();
        let id = mouse.id();
        let mut controller = crate::controller::Controller::Mouse(mouse);
        let mut dispatcher = RecordingDispatcher::handling(true);

        let handled = controller.handle(
            InputEventKind::MouseScroll {
                scroll: Vector2::new(0.0, -2.0),
                position: Vector2::new(0.3, 0.4),
            },
            &mut dispatcher,
        );

        assert!(handled);
        assert_eq!(
            dispatcher.take(),
            vec![ApplicationEvent::MouseScroll {
                mouse: id,
                scroll: Vector2::new(0.0, -2.0),
                position: Vector2::new(0.3, 0.4),
            }]
        );
        let crate::controller::Controller::Mouse(mouse) = controller else {
            panic!("controller changed kind");
        };
        assert_eq!(mouse.position(), Vector2::new(0.3, 0.4));
    }

    #[test]
    fn buttons_track_pressed_state() {
        let (mut mouse, _commands, _executor) = mouse();
        let mut dispatcher = RecordingDispatcher::default();

        mouse.handle_button_press(MouseButton::Right, Vector2::ZERO, &mut dispatcher);
        assert!(mouse.is_button_pressed(MouseButton::Right));
        assert!(!mouse.is_button_pressed(MouseButton::Left));

        mouse.handle_button_release(MouseButton::Right, Vector2::ZERO, &mut dispatcher);
        assert!(!mouse.is_button_pressed(MouseButton::Right));
    }

    #[test]
    fn setters_update_locally_and_queue_commands() {
        let (mut mouse, mut commands, _executor) = mouse();
        mouse.set_cursor_locked(true);
        mouse.set_cursor_visible(false);

        assert!(mouse.is_cursor_locked());
        assert!(!mouse.is_cursor_visible());
        assert_eq!(
            commands.try_next(),
            Some(Command::SetCursorLocked {
                device: mouse.id(),
                locked: true
            })
        );
        assert_eq!(
            commands.try_next(),
            Some(Command::SetCursorVisible {
                device: mouse.id(),
                visible: false
            })
        );
    }

    #[test]
    fn dropped_cursor_reads_back_as_none() {
        let (mut mouse, mut commands, executor) = mouse();
        let mut cursor = Cursor::new(executor, ResourceIds::new());
        cursor.init(SystemCursor::Hand);
        let resource = cursor.resource();

        mouse.set_cursor(Some(&cursor));
        assert_eq!(mouse.cursor_resource(), resource);

        drop(cursor);
        assert_eq!(mouse.cursor_resource(), ResourceId::NONE);

        let sent: Vec<_> = std::iter::from_fn(|| commands.try_next()).collect();
        assert_eq!(
            sent[1..],
            [
                Command::SetCursor {
                    device: mouse.id(),
                    resource
                },
                Command::DestroyCursor { resource },
            ]
        );
    }

    #[test]
    fn clearing_cursor_selects_default() {
        let (mut mouse, mut commands, _executor) = mouse();
        mouse.set_cursor(None);
        assert_eq!(
            commands.try_next(),
            Some(Command::SetCursor {
                device: mouse.id(),
                resource: ResourceId::NONE
            })
        );
    }
}
