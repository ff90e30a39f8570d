//! Owner of every live [`Device`] on the native-owning thread
//!
//! The registry is the only place devices are created and destroyed, the only
//! place commands are interpreted, and the native-side table of cursor resources.
//! It is never shared: everything here runs on the thread that owns OS handles.

use crate::bus::{
    Command, CompletionSignal, CursorSource, EventSender, InputEvent, InputEventKind, ResourceId,
    ResourceIds,
};
use crate::error::InputError;
use crate::native::backend::NativeBackend;
use crate::native::device::{Device, GamepadDevice, KeyboardDevice, MouseDevice, TouchpadDevice};
use crate::types::DeviceId;
use std::collections::HashMap;
use tracing::{debug, info};

/// A native cursor known to the registry, addressed by resource id
#[derive(Clone, Debug, PartialEq)]
pub struct CursorResource {
    pub id: ResourceId,
    pub source: CursorSource,
}

#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
    last_device_id: u64,
    events: EventSender,
    resource_ids: ResourceIds,
    cursors: Vec<Option<CursorResource>>,
    discovering: bool,
    virtual_keyboard_visible: bool,
}

impl DeviceRegistry {
    pub fn new(events: EventSender, resource_ids: ResourceIds) -> Self {
        Self {
            devices: HashMap::new(),
            last_device_id: 0,
            events,
            resource_ids,
            cursors: Vec::new(),
            discovering: false,
            virtual_keyboard_visible: false,
        }
    }

    /// Issues a fresh id; ids are never reused within a registry
    pub fn next_device_id(&mut self) -> DeviceId {
        self.last_device_id += 1;
        DeviceId::new(self.last_device_id)
    }

    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Registers a device and posts its connect event
    ///
    /// # Panics
    ///
    /// If a device with the same id is already registered.
    pub fn add_device(&mut self, device: Device) -> CompletionSignal {
        let id = device.id();
        assert!(
            !self.devices.contains_key(&id),
            "{id} is already registered"
        );

        info!("{} connected: {}", device.kind(), id);
        let signal = self.events.send(InputEvent::new(
            id,
            InputEventKind::DeviceConnect {
                kind: device.kind(),
                screen: device.is_screen(),
            },
        ));
        self.devices.insert(id, device);
        signal
    }

    pub fn add_keyboard(&mut self) -> DeviceId {
        let id = self.next_device_id();
        let device = KeyboardDevice::new(id, self.event_sender());
        self.add_device(Device::Keyboard(device)).ignore();
        id
    }

    pub fn add_mouse(&mut self) -> DeviceId {
        let id = self.next_device_id();
        let device = MouseDevice::new(id, self.event_sender());
        self.add_device(Device::Mouse(device)).ignore();
        id
    }

    pub fn add_gamepad(&mut self) -> DeviceId {
        let id = self.next_device_id();
        let device = GamepadDevice::new(id, self.event_sender());
        self.add_device(Device::Gamepad(device)).ignore();
        id
    }

    pub fn add_touchpad(&mut self, screen: bool) -> DeviceId {
        let id = self.next_device_id();
        let device = TouchpadDevice::new(id, self.event_sender(), screen);
        self.add_device(Device::Touchpad(device)).ignore();
        id
    }

    /// Posts the disconnect event, then forgets the device.
    /// Returns `None` if the id is unknown.
    pub fn remove_device(&mut self, id: DeviceId) -> Option<CompletionSignal> {
        let kind = self.devices.get(&id)?.kind();

        info!("{} disconnected: {}", kind, id);
        let signal = self
            .events
            .send(InputEvent::new(id, InputEventKind::DeviceDisconnect));
        self.devices.remove(&id);
        Some(signal)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn keyboard(&self, id: DeviceId) -> Option<&KeyboardDevice> {
        match self.devices.get(&id) {
            Some(Device::Keyboard(device)) => Some(device),
            _ => None,
        }
    }

    pub fn mouse(&self, id: DeviceId) -> Option<&MouseDevice> {
        match self.devices.get(&id) {
            Some(Device::Mouse(device)) => Some(device),
            _ => None,
        }
    }

    pub fn gamepad(&self, id: DeviceId) -> Option<&GamepadDevice> {
        match self.devices.get(&id) {
            Some(Device::Gamepad(device)) => Some(device),
            _ => None,
        }
    }

    pub fn touchpad(&self, id: DeviceId) -> Option<&TouchpadDevice> {
        match self.devices.get(&id) {
            Some(Device::Touchpad(device)) => Some(device),
            _ => None,
        }
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    pub fn is_virtual_keyboard_visible(&self) -> bool {
        self.virtual_keyboard_visible
    }

    /// Ends a discovery run and tells the game thread about it
    pub fn complete_discovery(&mut self) -> CompletionSignal {
        info!("Device discovery complete ({} devices)", self.devices.len());
        self.discovering = false;
        self.events.send(InputEvent::new(
            DeviceId::GLOBAL,
            InputEventKind::DeviceDiscoveryComplete,
        ))
    }

    pub fn send_event(&self, event: InputEvent) -> CompletionSignal {
        self.events.send(event)
    }

    pub fn get_resource_id(&self) -> ResourceId {
        self.resource_ids.allocate()
    }

    pub fn delete_resource_id(&self, id: ResourceId) {
        self.resource_ids.release(id)
    }

    pub fn cursor(&self, id: ResourceId) -> Option<&CursorResource> {
        cursor_entry(&self.cursors, id)
    }

    /// Applies one command. Commands for devices that are gone are dropped.
    pub fn execute_command(
        &mut self,
        command: &Command,
        backend: &mut dyn NativeBackend,
    ) -> Result<(), InputError> {
        debug!("Executing {}", command);

        match command {
            Command::StartDeviceDiscovery => {
                info!("Starting device discovery");
                self.discovering = true;
                backend.start_discovery()
            }
            Command::StopDeviceDiscovery => {
                info!("Stopping device discovery");
                self.discovering = false;
                backend.stop_discovery()
            }
            Command::SetAbsoluteDpadValues { device, enabled } => {
                let Some(Device::Gamepad(gamepad)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                gamepad.set_absolute_dpad_values(*enabled);
                backend.set_absolute_dpad_values(gamepad, *enabled)
            }
            Command::SetPlayerIndex {
                device,
                player_index,
            } => {
                let Some(Device::Gamepad(gamepad)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                gamepad.set_player_index(*player_index);
                backend.set_player_index(gamepad, *player_index)
            }
            Command::SetVibration {
                device,
                motor,
                speed,
            } => {
                let Some(Device::Gamepad(gamepad)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                gamepad.set_vibration(*motor, *speed);
                backend.set_vibration(gamepad, *motor, *speed)
            }
            Command::SetPosition { device, position } => {
                let Some(Device::Mouse(mouse)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                mouse.set_position(*position);
                backend.set_mouse_position(mouse, *position)
            }
            Command::InitCursor { resource, source } => {
                self.init_cursor(*resource, source, backend)
            }
            Command::DestroyCursor { resource } => self.destroy_cursor(*resource, backend),
            Command::SetCursor { device, resource } => {
                let cursor = if resource.is_none() {
                    None
                } else {
                    match cursor_entry(&self.cursors, *resource) {
                        Some(cursor) => Some(cursor),
                        None => {
                            debug!("Dropping {}: {} is not a live cursor", command, resource);
                            return Ok(());
                        }
                    }
                };
                let Some(Device::Mouse(mouse)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                mouse.set_cursor(*resource);
                backend.update_cursor(mouse, cursor)
            }
            Command::SetCursorVisible { device, visible } => {
                let Some(Device::Mouse(mouse)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                mouse.set_cursor_visible(*visible);
                let cursor = cursor_entry(&self.cursors, mouse.cursor());
                backend.update_cursor(mouse, cursor)
            }
            Command::SetCursorLocked { device, locked } => {
                let Some(Device::Mouse(mouse)) = self.devices.get_mut(device) else {
                    return dropped(command);
                };
                mouse.set_cursor_locked(*locked);
                backend.set_cursor_locked(mouse, *locked)
            }
            Command::ShowVirtualKeyboard => {
                self.virtual_keyboard_visible = true;
                backend.show_virtual_keyboard()
            }
            Command::HideVirtualKeyboard => {
                self.virtual_keyboard_visible = false;
                backend.hide_virtual_keyboard()
            }
        }
    }

    fn init_cursor(
        &mut self,
        resource: ResourceId,
        source: &CursorSource,
        backend: &mut dyn NativeBackend,
    ) -> Result<(), InputError> {
        let Some(slot) = resource.slot() else {
            debug!("Ignoring init-cursor without a resource id");
            return Ok(());
        };

        if slot >= self.cursors.len() {
            self.cursors.resize_with(slot + 1, || None);
        }

        // the old entry stays known until the platform has let go of it
        if let Some(previous) = &self.cursors[slot] {
            debug!("Replacing native cursor {}", resource);
            backend.destroy_cursor(previous)?;
            self.cursors[slot] = None;
        }

        let cursor = CursorResource {
            id: resource,
            source: source.clone(),
        };
        backend.create_cursor(&cursor)?;
        self.cursors[slot] = Some(cursor);

        // a mouse already showing this resource picks up the new image
        let cursor = self.cursors[slot].as_ref();
        let mut result = Ok(());
        for device in self.devices.values() {
            if let Device::Mouse(mouse) = device {
                if mouse.cursor() == resource {
                    keep_first_error(&mut result, backend.update_cursor(mouse, cursor));
                }
            }
        }
        result
    }

    fn destroy_cursor(
        &mut self,
        resource: ResourceId,
        backend: &mut dyn NativeBackend,
    ) -> Result<(), InputError> {
        let Some(cursor) = resource
            .slot()
            .and_then(|slot| self.cursors.get_mut(slot))
            .and_then(Option::take)
        else {
            debug!("Ignoring destroy-cursor for unknown {}", resource);
            return Ok(());
        };

        let mut result = Ok(());
        for device in self.devices.values_mut() {
            if let Device::Mouse(mouse) = device {
                if mouse.cursor() == resource {
                    debug!("{} lost its active cursor {}", mouse.id(), resource);
                    mouse.set_cursor(ResourceId::NONE);
                    keep_first_error(&mut result, backend.update_cursor(mouse, None));
                }
            }
        }

        keep_first_error(&mut result, backend.destroy_cursor(&cursor));
        result
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        let mut ids: Vec<DeviceId> = self.devices.keys().copied().collect();
        ids.sort();
        for id in ids {
            if let Some(signal) = self.remove_device(id) {
                signal.ignore();
            }
        }
    }
}

fn cursor_entry(cursors: &[Option<CursorResource>], id: ResourceId) -> Option<&CursorResource> {
    cursors.get(id.slot()?)?.as_ref()
}

/// Every step still runs; the first failure is the one reported
fn keep_first_error(result: &mut Result<(), InputError>, step: Result<(), InputError>) {
    if let Err(e) = step {
        if result.is_ok() {
            *result = Err(e);
        } else {
            debug!("Further cursor step failed: {}", e);
        }
    }
}

fn dropped(command: &Command) -> Result<(), InputError> {
    debug!("Dropping {}: target device is gone", command);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::channel::event_channel;
    use crate::bus::EventReceiver;
    use crate::native::testing::RecordingBackend;
    use crate::types::{ControllerKind, Motor, SystemCursor, Vector2};

    fn registry() -> (DeviceRegistry, EventReceiver) {
        let (sender, receiver) = event_channel(64);
        (DeviceRegistry::new(sender, ResourceIds::new()), receiver)
    }

    fn kinds(receiver: &EventReceiver) -> Vec<(DeviceId, InputEventKind)> {
        receiver
            .drain()
            .into_iter()
            .map(|(event, _)| (event.device, event.kind))
            .collect()
    }

    #[test]
    fn add_and_remove_post_connect_then_disconnect() {
        let (mut registry, receiver) = registry();
        let pad = registry.add_touchpad(true);
        assert!(registry.remove_device(pad).is_some());
        assert!(registry.remove_device(pad).is_none());

        assert_eq!(
            kinds(&receiver),
            vec![
                (
                    pad,
                    InputEventKind::DeviceConnect {
                        kind: ControllerKind::Touchpad,
                        screen: true
                    }
                ),
                (pad, InputEventKind::DeviceDisconnect),
            ]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn device_ids_are_not_reused() {
        let (mut registry, _receiver) = registry();
        let first = registry.add_keyboard();
        registry.remove_device(first);
        let second = registry.add_keyboard();
        assert_ne!(first, second);
        assert!(!first.is_global());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_device_id_panics() {
        let (mut registry, _receiver) = registry();
        let id = registry.next_device_id();
        let events = registry.event_sender();
        registry.add_device(Device::Keyboard(KeyboardDevice::new(id, events.clone())));
        registry.add_device(Device::Keyboard(KeyboardDevice::new(id, events)));
    }

    #[test]
    fn vibration_for_vanished_gamepad_is_dropped() {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let gone = registry.add_gamepad();
        let present = registry.add_gamepad();
        registry.remove_device(gone);

        for device in [gone, present] {
            let command = Command::SetVibration {
                device,
                motor: Motor::Left,
                speed: 0.75,
            };
            assert!(registry.execute_command(&command, &mut backend).is_ok());
        }

        assert_eq!(backend.calls, vec![format!("set_vibration {present} Left 0.75")]);
        assert_eq!(registry.gamepad(present).unwrap().vibration(Motor::Left), 0.75);
    }

    #[test]
    fn destroying_active_cursor_reverts_mouse_to_default() {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let mouse = registry.add_mouse();
        let resource = registry.get_resource_id();

        let commands = [
            Command::InitCursor {
                resource,
                source: CursorSource::System(SystemCursor::Hand),
            },
            Command::SetCursor {
                device: mouse,
                resource,
            },
        ];
        for command in &commands {
            registry.execute_command(command, &mut backend).unwrap();
        }
        assert_eq!(registry.mouse(mouse).unwrap().cursor(), resource);

        registry
            .execute_command(&Command::DestroyCursor { resource }, &mut backend)
            .unwrap();

        assert_eq!(registry.mouse(mouse).unwrap().cursor(), ResourceId::NONE);
        assert!(registry.cursor(resource).is_none());
        assert_eq!(
            backend.calls,
            vec![
                format!("create_cursor {resource}"),
                format!("update_cursor {mouse} {resource}"),
                format!("update_cursor {mouse} default"),
                format!("destroy_cursor {resource}"),
            ]
        );
    }

    fn registry_with_active_cursor() -> (DeviceRegistry, RecordingBackend, DeviceId, ResourceId) {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let mouse = registry.add_mouse();
        let resource = registry.get_resource_id();

        let commands = [
            Command::InitCursor {
                resource,
                source: CursorSource::System(SystemCursor::Hand),
            },
            Command::SetCursor {
                device: mouse,
                resource,
            },
        ];
        for command in &commands {
            registry.execute_command(command, &mut backend).unwrap();
        }
        backend.calls.clear();
        (registry, backend, mouse, resource)
    }

    #[test]
    fn failed_mouse_reset_still_destroys_cursor() {
        let (mut registry, mut backend, mouse, resource) = registry_with_active_cursor();
        let other = registry.add_mouse();
        registry
            .execute_command(
                &Command::SetCursor {
                    device: other,
                    resource,
                },
                &mut backend,
            )
            .unwrap();
        backend.calls.clear();
        backend.fail_on = Some("update_cursor");

        let result = registry.execute_command(&Command::DestroyCursor { resource }, &mut backend);

        assert!(matches!(result, Err(InputError::Platform(_))));
        assert!(backend.calls.contains(&format!("destroy_cursor {resource}")));
        assert_eq!(
            backend.calls.iter().filter(|c| c.starts_with("update_cursor")).count(),
            2
        );
        for id in [mouse, other] {
            assert_eq!(registry.mouse(id).unwrap().cursor(), ResourceId::NONE);
        }
        assert!(registry.cursor(resource).is_none());
    }

    #[test]
    fn failed_replace_keeps_previous_cursor() {
        let (mut registry, mut backend, mouse, resource) = registry_with_active_cursor();
        backend.fail_on = Some("destroy_cursor");

        let result = registry.execute_command(
            &Command::InitCursor {
                resource,
                source: CursorSource::System(SystemCursor::Cross),
            },
            &mut backend,
        );

        assert!(result.is_err());
        assert_eq!(
            registry.cursor(resource).map(|cursor| &cursor.source),
            Some(&CursorSource::System(SystemCursor::Hand))
        );
        assert_eq!(registry.mouse(mouse).unwrap().cursor(), resource);
        assert_eq!(backend.calls, vec![format!("destroy_cursor {resource}")]);
    }

    #[test]
    fn set_cursor_with_stale_resource_is_dropped() {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let mouse = registry.add_mouse();

        let stale = registry.get_resource_id();
        registry
            .execute_command(
                &Command::SetCursor {
                    device: mouse,
                    resource: stale,
                },
                &mut backend,
            )
            .unwrap();

        assert_eq!(registry.mouse(mouse).unwrap().cursor(), ResourceId::NONE);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn hidden_cursor_is_reapplied() {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let mouse = registry.add_mouse();

        registry
            .execute_command(
                &Command::SetCursorVisible {
                    device: mouse,
                    visible: false,
                },
                &mut backend,
            )
            .unwrap();

        assert!(!registry.mouse(mouse).unwrap().is_cursor_visible());
        assert_eq!(backend.calls, vec![format!("update_cursor {mouse} hidden")]);
    }

    #[test]
    fn discovery_flags_and_completion_event() {
        let (mut registry, receiver) = registry();
        let mut backend = RecordingBackend::default();

        registry
            .execute_command(&Command::StartDeviceDiscovery, &mut backend)
            .unwrap();
        assert!(registry.is_discovering());

        registry.complete_discovery().ignore();
        assert!(!registry.is_discovering());
        assert_eq!(
            kinds(&receiver),
            vec![(DeviceId::GLOBAL, InputEventKind::DeviceDiscoveryComplete)]
        );
    }

    #[test]
    fn mouse_position_command_updates_native_state() {
        let (mut registry, _receiver) = registry();
        let mut backend = RecordingBackend::default();
        let mouse = registry.add_mouse();

        let position = Vector2::new(0.5, 0.25);
        registry
            .execute_command(
                &Command::SetPosition {
                    device: mouse,
                    position,
                },
                &mut backend,
            )
            .unwrap();
        assert_eq!(registry.mouse(mouse).unwrap().position(), position);
    }

    #[test]
    fn dropping_registry_disconnects_remaining_devices() {
        let (mut registry, receiver) = registry();
        let keyboard = registry.add_keyboard();
        let mouse = registry.add_mouse();
        receiver.drain();

        drop(registry);

        assert_eq!(
            kinds(&receiver),
            vec![
                (keyboard, InputEventKind::DeviceDisconnect),
                (mouse, InputEventKind::DeviceDisconnect),
            ]
        );
    }
}
