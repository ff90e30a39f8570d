//! Owner of every game-side controller
//!
//! `update()` is the only consumer of the event pipe. It swaps out the whole
//! queue once, then for each event, in arrival order: creates or removes the
//! controller for connect/disconnect, routes everything else to the controller
//! with the matching id, and answers the event's completion with what the
//! dispatcher returned.
//!
//! "Current" keyboard, mouse and touchpad are plain ids into the controller map.
//! The first controller of a kind becomes current; when the current one
//! disconnects, the earliest-connected remaining controller of that kind takes
//! over.

use crate::bus::{
    Command, CommandExecutor, EventReceiver, GameEndpoint, InputEvent, InputEventKind, ResourceIds,
};
use crate::controller::cursor::Cursor;
use crate::controller::dispatch::{ApplicationEvent, EventDispatcher};
use crate::controller::{Controller, Gamepad, Keyboard, Mouse, Touchpad};
use crate::types::{ControllerKind, DeviceId};
use chrono::Local;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

pub struct ControllerManager<D: EventDispatcher> {
    controllers: HashMap<DeviceId, Controller>,
    // connection order, for iteration and re-election
    order: Vec<DeviceId>,
    current_keyboard: Option<DeviceId>,
    current_mouse: Option<DeviceId>,
    current_touchpad: Option<DeviceId>,

    events: EventReceiver,
    commands: Arc<dyn CommandExecutor>,
    resource_ids: ResourceIds,
    dispatcher: D,
    discovering: bool,
}

impl<D: EventDispatcher> ControllerManager<D> {
    /// Uses the endpoint's queued command pipe
    pub fn new(endpoint: GameEndpoint, dispatcher: D) -> Self {
        let GameEndpoint {
            events,
            commands,
            resource_ids,
        } = endpoint;
        Self::with_executor(events, Arc::new(commands), resource_ids, dispatcher)
    }

    /// Uses a host-supplied executor to hop commands to the owning thread
    pub fn with_executor(
        events: EventReceiver,
        commands: Arc<dyn CommandExecutor>,
        resource_ids: ResourceIds,
        dispatcher: D,
    ) -> Self {
        debug!("Creating controller manager");
        Self {
            controllers: HashMap::new(),
            order: Vec::new(),
            current_keyboard: None,
            current_mouse: None,
            current_touchpad: None,
            events,
            commands,
            resource_ids,
            dispatcher,
            discovering: false,
        }
    }

    /// Processes every event queued at call time. Call once per game tick.
    /// Returns the number of events processed.
    pub fn update(&mut self) -> usize {
        let batch = self.events.drain();
        let count = batch.len();

        for (event, completion) in batch {
            let handled = self.handle_event(event);
            completion.fulfill(handled);
        }

        if count > 0 {
            trace!("Processed {} input events", count);
        }
        count
    }

    /// Events posted but not yet drained
    pub fn pending_events(&self) -> usize {
        self.events.pending()
    }

    fn handle_event(&mut self, event: InputEvent) -> bool {
        let InputEvent {
            device,
            timestamp,
            kind,
        } = event;
        trace!(
            "{} from {} after {} µs in queue",
            kind.name(),
            device,
            (Local::now() - timestamp).num_microseconds().unwrap_or(i64::MAX)
        );

        match kind {
            InputEventKind::DeviceConnect { kind, screen } => self.connect(device, kind, screen),
            InputEventKind::DeviceDisconnect => self.disconnect(device),
            InputEventKind::DeviceDiscoveryComplete => {
                info!("Device discovery complete");
                self.discovering = false;
                false
            }
            other => {
                let Some(controller) = self.controllers.get_mut(&device) else {
                    debug!("Dropping {} for unknown {}", other.name(), device);
                    return false;
                };
                controller.handle(other, &mut self.dispatcher)
            }
        }
    }

    fn connect(&mut self, device: DeviceId, kind: ControllerKind, screen: bool) -> bool {
        if self.controllers.contains_key(&device) {
            debug!("Ignoring repeated connect for {}", device);
            return false;
        }

        let (controller, event) = match kind {
            ControllerKind::Keyboard => (
                Controller::Keyboard(Keyboard::new(device)),
                ApplicationEvent::KeyboardConnect { keyboard: device },
            ),
            ControllerKind::Mouse => (
                Controller::Mouse(Mouse::new(device, self.commands.clone())),
                ApplicationEvent::MouseConnect { mouse: device },
            ),
            ControllerKind::Gamepad => (
                Controller::Gamepad(Gamepad::new(device, self.commands.clone())),
                ApplicationEvent::GamepadConnect { gamepad: device },
            ),
            ControllerKind::Touchpad => (
                Controller::Touchpad(Touchpad::new(device, screen)),
                ApplicationEvent::TouchpadConnect {
                    touchpad: device,
                    screen,
                },
            ),
        };

        info!("{} connected: {}", kind, device);
        self.controllers.insert(device, controller);
        self.order.push(device);

        if let Some(current) = self.current_slot(kind) {
            if current.is_none() {
                debug!("{} is now the current {}", device, kind);
                *current = Some(device);
            }
        }

        self.dispatcher.dispatch(event)
    }

    fn disconnect(&mut self, device: DeviceId) -> bool {
        let Some(controller) = self.controllers.remove(&device) else {
            debug!("Ignoring disconnect for unknown {}", device);
            return false;
        };
        self.order.retain(|id| *id != device);

        let kind = controller.kind();
        info!("{} disconnected: {}", kind, device);

        let replacement = self.first_of_kind(kind);
        if let Some(current) = self.current_slot(kind) {
            if *current == Some(device) {
                *current = replacement;
                match replacement {
                    Some(next) => debug!("{} is now the current {}", next, kind),
                    None => debug!("No {} left", kind),
                }
            }
        }

        let event = match kind {
            ControllerKind::Keyboard => ApplicationEvent::KeyboardDisconnect { keyboard: device },
            ControllerKind::Mouse => ApplicationEvent::MouseDisconnect { mouse: device },
            ControllerKind::Gamepad => ApplicationEvent::GamepadDisconnect { gamepad: device },
            ControllerKind::Touchpad => ApplicationEvent::TouchpadDisconnect { touchpad: device },
        };
        self.dispatcher.dispatch(event)
    }

    fn current_slot(&mut self, kind: ControllerKind) -> Option<&mut Option<DeviceId>> {
        match kind {
            ControllerKind::Keyboard => Some(&mut self.current_keyboard),
            ControllerKind::Mouse => Some(&mut self.current_mouse),
            ControllerKind::Touchpad => Some(&mut self.current_touchpad),
            ControllerKind::Gamepad => None,
        }
    }

    fn first_of_kind(&self, kind: ControllerKind) -> Option<DeviceId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.controllers.get(id).map(Controller::kind) == Some(kind))
    }

    pub fn controller(&self, id: DeviceId) -> Option<&Controller> {
        self.controllers.get(&id)
    }

    pub fn controller_mut(&mut self, id: DeviceId) -> Option<&mut Controller> {
        self.controllers.get_mut(&id)
    }

    /// All controllers in connection order
    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.order.iter().filter_map(|id| self.controllers.get(id))
    }

    pub fn gamepads(&self) -> impl Iterator<Item = &Gamepad> {
        self.controllers().filter_map(Controller::as_gamepad)
    }

    pub fn gamepad(&self, id: DeviceId) -> Option<&Gamepad> {
        self.controllers.get(&id)?.as_gamepad()
    }

    pub fn gamepad_mut(&mut self, id: DeviceId) -> Option<&mut Gamepad> {
        self.controllers.get_mut(&id)?.as_gamepad_mut()
    }

    /// Current keyboard
    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self.controllers.get(&self.current_keyboard?)? {
            Controller::Keyboard(keyboard) => Some(keyboard),
            _ => None,
        }
    }

    /// Current mouse
    pub fn mouse(&self) -> Option<&Mouse> {
        match self.controllers.get(&self.current_mouse?)? {
            Controller::Mouse(mouse) => Some(mouse),
            _ => None,
        }
    }

    pub fn mouse_mut(&mut self) -> Option<&mut Mouse> {
        match self.controllers.get_mut(&self.current_mouse?)? {
            Controller::Mouse(mouse) => Some(mouse),
            _ => None,
        }
    }

    /// Current touchpad
    pub fn touchpad(&self) -> Option<&Touchpad> {
        match self.controllers.get(&self.current_touchpad?)? {
            Controller::Touchpad(touchpad) => Some(touchpad),
            _ => None,
        }
    }

    pub fn touchpad_mut(&mut self) -> Option<&mut Touchpad> {
        match self.controllers.get_mut(&self.current_touchpad?)? {
            Controller::Touchpad(touchpad) => Some(touchpad),
            _ => None,
        }
    }

    /// Advisory: set on request, cleared by the discovery-complete event
    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    pub fn start_device_discovery(&mut self) {
        info!("Requesting device discovery");
        self.discovering = true;
        self.commands
            .execute_on_owning_thread(Command::StartDeviceDiscovery);
    }

    pub fn stop_device_discovery(&mut self) {
        self.discovering = false;
        self.commands
            .execute_on_owning_thread(Command::StopDeviceDiscovery);
    }

    pub fn show_virtual_keyboard(&self) {
        self.commands
            .execute_on_owning_thread(Command::ShowVirtualKeyboard);
    }

    pub fn hide_virtual_keyboard(&self) {
        self.commands
            .execute_on_owning_thread(Command::HideVirtualKeyboard);
    }

    /// New uninitialized cursor bound to this manager's command pipe
    pub fn create_cursor(&self) -> Cursor {
        Cursor::new(self.commands.clone(), self.resource_ids.clone())
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{connect, NativeEndpoint};
    use crate::config::EventSettings;
    use crate::controller::dispatch::RecordingDispatcher;
    use crate::types::{GamepadButton, Key, MouseButton, Vector2};

    fn manager() -> (ControllerManager<RecordingDispatcher>, NativeEndpoint) {
        let (game, native) = connect(&EventSettings::default());
        (
            ControllerManager::new(game, RecordingDispatcher::handling(true)),
            native,
        )
    }

    fn post(native: &NativeEndpoint, device: u64, kind: InputEventKind) {
        native
            .events
            .send(InputEvent::new(DeviceId::new(device), kind))
            .ignore();
    }

    fn connect_kind(native: &NativeEndpoint, device: u64, kind: ControllerKind) {
        post(
            native,
            device,
            InputEventKind::DeviceConnect {
                kind,
                screen: false,
            },
        );
    }

    #[test]
    fn events_dispatch_in_arrival_order_within_one_update() {
        let (mut manager, native) = manager();
        connect_kind(&native, 1, ControllerKind::Keyboard);
        post(&native, 1, InputEventKind::KeyPress { key: Key::A });
        post(&native, 1, InputEventKind::KeyRelease { key: Key::A });

        assert_eq!(manager.update(), 3);

        let keyboard = DeviceId::new(1);
        assert_eq!(
            manager.dispatcher_mut().take(),
            vec![
                ApplicationEvent::KeyboardConnect { keyboard },
                ApplicationEvent::KeyPress {
                    keyboard,
                    key: Key::A
                },
                ApplicationEvent::KeyRelease {
                    keyboard,
                    key: Key::A
                },
            ]
        );
        assert_eq!(manager.update(), 0);
    }

    #[test]
    fn completion_carries_dispatcher_result() {
        let (game, native) = connect(&EventSettings::default());
        let mut manager = ControllerManager::new(game, |event: ApplicationEvent| {
            matches!(event, ApplicationEvent::MousePress { .. })
        });

        let mouse = DeviceId::new(1);
        let mut connect_signal = native.events.send(InputEvent::new(
            mouse,
            InputEventKind::DeviceConnect {
                kind: ControllerKind::Mouse,
                screen: false,
            },
        ));
        let mut press_signal = native.events.send(InputEvent::new(
            mouse,
            InputEventKind::MousePress {
                button: MouseButton::Left,
                position: Vector2::ZERO,
            },
        ));
        let mut stray_signal = native.events.send(InputEvent::new(
            DeviceId::new(99),
            InputEventKind::KeyPress { key: Key::Q },
        ));
        assert_eq!(press_signal.try_result(), None);

        manager.update();

        assert_eq!(connect_signal.try_result(), Some(false));
        assert_eq!(press_signal.try_result(), Some(true));
        assert_eq!(stray_signal.try_result(), Some(false));
    }

    #[test]
    fn current_mouse_is_reelected_from_remaining_mice() {
        let (mut manager, native) = manager();
        for device in [1, 2, 3] {
            connect_kind(&native, device, ControllerKind::Mouse);
        }
        manager.update();
        assert_eq!(manager.mouse().map(Mouse::id), Some(DeviceId::new(1)));

        post(&native, 1, InputEventKind::DeviceDisconnect);
        manager.update();
        assert_eq!(manager.mouse().map(Mouse::id), Some(DeviceId::new(2)));

        post(&native, 3, InputEventKind::DeviceDisconnect);
        post(&native, 2, InputEventKind::DeviceDisconnect);
        manager.update();
        assert!(manager.mouse().is_none());
        assert_eq!(manager.controllers().count(), 0);
    }

    #[test]
    fn later_devices_do_not_steal_current() {
        let (mut manager, native) = manager();
        connect_kind(&native, 1, ControllerKind::Keyboard);
        connect_kind(&native, 2, ControllerKind::Touchpad);
        connect_kind(&native, 3, ControllerKind::Keyboard);
        manager.update();

        assert_eq!(manager.keyboard().map(Keyboard::id), Some(DeviceId::new(1)));
        assert_eq!(manager.touchpad().map(Touchpad::id), Some(DeviceId::new(2)));

        post(&native, 3, InputEventKind::DeviceDisconnect);
        manager.update();
        assert_eq!(manager.keyboard().map(Keyboard::id), Some(DeviceId::new(1)));
    }

    #[test]
    fn gamepad_state_and_connection_order() {
        let (mut manager, native) = manager();
        connect_kind(&native, 4, ControllerKind::Gamepad);
        connect_kind(&native, 2, ControllerKind::Gamepad);
        post(
            &native,
            2,
            InputEventKind::GamepadButtonChange {
                button: GamepadButton::FaceTop,
                pressed: true,
                value: 1.0,
            },
        );
        manager.update();

        let ids: Vec<_> = manager.gamepads().map(Gamepad::id).collect();
        assert_eq!(ids, vec![DeviceId::new(4), DeviceId::new(2)]);
        assert!(manager
            .gamepad(DeviceId::new(2))
            .unwrap()
            .is_button_pressed(GamepadButton::FaceTop));
    }

    #[test]
    fn discovery_flag_is_optimistic_until_complete() {
        let (mut manager, mut native) = manager();
        manager.start_device_discovery();
        assert!(manager.is_discovering());
        assert_eq!(
            native.commands.try_next(),
            Some(Command::StartDeviceDiscovery)
        );

        post(&native, 0, InputEventKind::DeviceDiscoveryComplete);
        manager.update();
        assert!(!manager.is_discovering());
    }

    #[test]
    fn events_for_wrong_controller_kind_are_unhandled() {
        let (mut manager, native) = manager();
        connect_kind(&native, 1, ControllerKind::Keyboard);
        manager.update();
        manager.dispatcher_mut().take();

        let mut signal = native.events.send(InputEvent::new(
            DeviceId::new(1),
            InputEventKind::MouseMove {
                position: Vector2::ZERO,
            },
        ));
        manager.update();

        assert_eq!(signal.try_result(), Some(false));
        assert!(manager.dispatcher_mut().take().is_empty());
    }

    #[test]
    fn virtual_keyboard_commands() {
        let (manager, mut native) = manager();
        manager.show_virtual_keyboard();
        manager.hide_virtual_keyboard();

        assert_eq!(native.commands.try_next(), Some(Command::ShowVirtualKeyboard));
        assert_eq!(native.commands.try_next(), Some(Command::HideVirtualKeyboard));
    }

    #[test]
    fn mouse_setters_reach_native_side() {
        let (mut manager, mut native) = manager();
        connect_kind(&native, 6, ControllerKind::Mouse);
        manager.update();

        let mut cursor = manager.create_cursor();
        cursor.init(crate::types::SystemCursor::Arrow);
        let resource = cursor.resource();
        let mouse = manager.mouse_mut().unwrap();
        mouse.set_cursor(Some(&cursor));

        assert!(matches!(
            native.commands.try_next(),
            Some(Command::InitCursor { .. })
        ));
        assert_eq!(
            native.commands.try_next(),
            Some(Command::SetCursor {
                device: DeviceId::new(6),
                resource
            })
        );
    }
}
