use color_eyre::{eyre::eyre, Result};
use inputbus::bus;
use inputbus::config::{InputConfig, NativeSettings};
use inputbus::controller::{ApplicationEvent, ControllerManager, Cursor};
use inputbus::native::{InputThread, NativeBackend, VirtualBackend, VirtualInput};
use inputbus::types::{GamepadButton, Key, MouseButton, SystemCursor, Vector2};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = InputConfig::load_or_default();
    config.validate()?;
    info!("Starting input bus demo with {:?}", config);

    let (game, native) = bus::connect(&config.events);
    let cancel = CancellationToken::new();
    let (input_tx, input_rx) = oneshot::channel();

    // Native thread: owns devices and the backend for its whole lifetime
    let native_settings = config.native.clone();
    let native_cancel = cancel.clone();
    let native_thread = std::thread::Builder::new()
        .name("input-native".to_string())
        .spawn(move || {
            let (backend, input) = native_backend(&native_settings);
            if input_tx.send(input).is_err() {
                warn!("Game loop is gone before the native thread started");
            }

            let thread = InputThread::create(native, backend, native_settings);
            match thread.initialize() {
                Ok(mut running) => {
                    running.run_until_cancelled(&native_cancel);
                    running.shutdown();
                }
                Err(e) => error!("Failed to initialize input thread: {}", e),
            }
        })?;

    let input = input_rx
        .await
        .map_err(|_| eyre!("Native input thread exited before start"))?;

    let mut manager = ControllerManager::new(game, |event: ApplicationEvent| {
        info!("{:?}", event);
        true
    });

    // scripted input only exists when the virtual backend is live
    let mut script = input.map(|input| tokio::spawn(play_script(input)));
    if script.is_none() {
        info!("Hardware backend active, press Ctrl-C to stop");
    }
    let mut ticker = tokio::time::interval(config.game.tick_interval());
    let mut cursor: Option<Cursor> = None;

    // Game loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                manager.update();

                if cursor.is_none() && manager.mouse().is_some() {
                    let mut hand = manager.create_cursor();
                    hand.init(SystemCursor::Hand);
                    if let Some(mouse) = manager.mouse_mut() {
                        mouse.set_cursor(Some(&hand));
                        mouse.set_cursor_locked(true);
                    }
                    cursor = Some(hand);
                }
            }
            result = async {
                match script.as_mut() {
                    Some(task) => task.await,
                    None => std::future::pending().await,
                }
            } => {
                if let Err(e) = result {
                    warn!("Input script failed: {}", e);
                }
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // let the last scripted occurrences arrive before stopping
    tokio::time::sleep(config.native.poll_interval() * 4).await;
    manager.update();
    drop(cursor);

    cancel.cancel();
    native_thread
        .join()
        .map_err(|_| eyre!("Native input thread panicked"))?;

    let remaining = manager.update();
    info!("Processed {} final events, shutting down", remaining);
    Ok(())
}

type SelectedBackend = (Box<dyn NativeBackend>, Option<VirtualInput>);

#[cfg(feature = "gilrs")]
fn native_backend(settings: &NativeSettings) -> SelectedBackend {
    match inputbus::native::GilrsBackend::create(settings) {
        Ok(backend) => (Box::new(backend), None),
        Err(e) => {
            warn!("Falling back to virtual input: {}", e);
            virtual_backend()
        }
    }
}

#[cfg(not(feature = "gilrs"))]
fn native_backend(_settings: &NativeSettings) -> SelectedBackend {
    virtual_backend()
}

fn virtual_backend() -> SelectedBackend {
    let (backend, input) = VirtualBackend::new();
    (Box::new(backend), Some(input))
}

async fn play_script(input: VirtualInput) {
    let step = Duration::from_millis(50);

    input.move_mouse(Vector2::new(0.5, 0.5));
    tokio::time::sleep(step).await;
    input.press_mouse_button(MouseButton::Left);
    input.release_mouse_button(MouseButton::Left);
    input.move_mouse_by(Vector2::new(0.1, 0.0));
    input.scroll(Vector2::new(0.0, 1.0));
    tokio::time::sleep(step).await;

    for key in [Key::H, Key::I] {
        input.tap_key(key);
    }
    tokio::time::sleep(step).await;

    input.press_gamepad_button(0, GamepadButton::FaceBottom);
    input.set_gamepad_button(0, GamepadButton::RightTrigger, 0.4);
    tokio::time::sleep(step).await;
    input.release_gamepad_button(0, GamepadButton::FaceBottom);

    input.touch_begin(7, Vector2::new(0.2, 0.3));
    input.touch_move(7, Vector2::new(0.25, 0.3));
    input.touch_end(7, Vector2::new(0.25, 0.3));
    tokio::time::sleep(step).await;
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
