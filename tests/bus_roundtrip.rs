use inputbus::bus::{self, CommandExecutor, NativeEndpoint};
use inputbus::config::{EventSettings, NativeSettings};
use inputbus::controller::{ApplicationEvent, ControllerManager, RecordingDispatcher};
use inputbus::native::{DeviceRegistry, InputThread, VirtualBackend, VirtualInput};
use inputbus::types::{Key, SystemCursor};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_native(native: NativeEndpoint, cancel: CancellationToken) -> (JoinHandle<()>, VirtualInput) {
    let (input_tx, input_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let (backend, input) = VirtualBackend::new();
        input_tx.send(input).unwrap();

        let settings = NativeSettings {
            poll_interval_ms: 1,
            ..NativeSettings::default()
        };
        let mut running = InputThread::create(native, Box::new(backend), settings)
            .initialize()
            .unwrap();
        running.run_until_cancelled(&cancel);
        running.shutdown();
    });
    (handle, input_rx.recv().unwrap())
}

/// Ticks the game side until `done` holds or the timeout expires
fn update_until(
    manager: &mut ControllerManager<RecordingDispatcher>,
    mut done: impl FnMut(&ControllerManager<RecordingDispatcher>) -> bool,
) {
    let start = Instant::now();
    while !done(manager) {
        assert!(start.elapsed() < TIMEOUT, "timed out waiting for events");
        manager.update();
        thread::sleep(Duration::from_millis(1));
    }
}

fn seen(manager: &ControllerManager<RecordingDispatcher>, expected: &ApplicationEvent) -> bool {
    manager.dispatcher().events.contains(expected)
}

#[test]
fn native_thread_and_game_loop_roundtrip() {
    let (game, native) = bus::connect(&EventSettings::default());
    let cancel = CancellationToken::new();
    let (native_thread, input) = spawn_native(native, cancel.clone());
    let mut manager = ControllerManager::new(game, RecordingDispatcher::handling(true));

    update_until(&mut manager, |m| {
        m.keyboard().is_some() && m.mouse().is_some() && m.touchpad().is_some()
    });
    assert_eq!(manager.gamepads().count(), 1);
    assert!(manager.touchpad().unwrap().is_screen());

    let keyboard = manager.keyboard().unwrap().id();
    input.tap_key(Key::Space);
    let release = ApplicationEvent::KeyRelease {
        keyboard,
        key: Key::Space,
    };
    update_until(&mut manager, |m| seen(m, &release));

    let events = &manager.dispatcher().events;
    let press_at = events
        .iter()
        .position(|e| {
            *e == ApplicationEvent::KeyPress {
                keyboard,
                key: Key::Space,
            }
        })
        .unwrap();
    let release_at = events.iter().position(|e| *e == release).unwrap();
    assert!(press_at < release_at);

    // the virtual platform confirms a lock request with a lock-change event
    let mouse = manager.mouse().unwrap().id();
    manager.mouse_mut().unwrap().set_cursor_locked(true);
    let locked = ApplicationEvent::MouseCursorLockChange {
        mouse,
        locked: true,
    };
    update_until(&mut manager, |m| seen(m, &locked));

    cancel.cancel();
    native_thread.join().unwrap();

    update_until(&mut manager, |m| m.controllers().count() == 0);
    assert!(seen(&manager, &ApplicationEvent::KeyboardDisconnect { keyboard }));
    assert!(manager.mouse().is_none());
}

#[test]
fn native_caller_can_wait_for_the_handled_result() {
    let (game, native) = bus::connect(&EventSettings::default());
    let mut manager = ControllerManager::new(game, |event: ApplicationEvent| {
        matches!(event, ApplicationEvent::KeyPress { key: Key::Enter, .. })
    });

    let poster = thread::spawn(move || {
        let mut registry = DeviceRegistry::new(native.events, native.resource_ids);
        let id = registry.add_keyboard();
        let keyboard = registry.keyboard(id).unwrap();
        let enter = keyboard.handle_key_press(Key::Enter).wait();
        let escape = keyboard.handle_key_press(Key::Escape).wait();
        (enter, escape)
    });

    let start = Instant::now();
    while !poster.is_finished() {
        assert!(start.elapsed() < TIMEOUT, "poster never got an answer");
        manager.update();
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(poster.join().unwrap(), (Some(true), Some(false)));
}

#[test]
fn dropped_cursor_resets_native_mouse() {
    let (game, native) = bus::connect(&EventSettings::default());
    let NativeEndpoint {
        events,
        mut commands,
        resource_ids,
    } = native;
    let mut registry = DeviceRegistry::new(events, resource_ids);
    let mut backend = inputbus::native::NullBackend;
    let mouse_id = registry.add_mouse();

    let mut manager = ControllerManager::new(game, RecordingDispatcher::default());
    manager.update();

    let mut cursor = manager.create_cursor();
    cursor.init(SystemCursor::Cross);
    let resource = cursor.resource();
    manager.mouse_mut().unwrap().set_cursor(Some(&cursor));

    let mut apply = |registry: &mut DeviceRegistry| {
        while let Some(command) = commands.try_next() {
            registry.execute_command(&command, &mut backend).unwrap();
        }
    };

    apply(&mut registry);
    assert_eq!(registry.mouse(mouse_id).unwrap().cursor(), resource);

    drop(cursor);
    assert!(manager.mouse().unwrap().cursor_resource().is_none());
    apply(&mut registry);
    assert!(registry.mouse(mouse_id).unwrap().cursor().is_none());
    assert!(registry.cursor(resource).is_none());
}

#[test]
fn custom_executor_receives_commands() {
    #[derive(Default)]
    struct Collect(std::sync::Mutex<Vec<bus::Command>>);

    impl CommandExecutor for Collect {
        fn execute_on_owning_thread(&self, command: bus::Command) {
            self.0.lock().unwrap().push(command);
        }
    }

    let (game, _native) = bus::connect(&EventSettings::default());
    let executor = std::sync::Arc::new(Collect::default());
    let mut manager = ControllerManager::with_executor(
        game.events,
        executor.clone(),
        game.resource_ids,
        RecordingDispatcher::default(),
    );

    manager.start_device_discovery();
    manager.show_virtual_keyboard();

    assert_eq!(
        *executor.0.lock().unwrap(),
        vec![bus::Command::StartDeviceDiscovery, bus::Command::ShowVirtualKeyboard]
    );
}
