//! Lifecycle of the thread that owns native input handles
//!
//! `InputThread<Initializing>` runs the startup discovery pass, then becomes
//! `InputThread<Running>`, which alternates between draining queued commands and
//! polling the backend until cancelled.

use crate::bus::{CommandReceiver, NativeEndpoint};
use crate::config::NativeSettings;
use crate::error::InputError;
use crate::native::backend::NativeBackend;
use crate::native::registry::DeviceRegistry;
use statum::{machine, state};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[state]
#[derive(Debug, Clone)]
pub enum InputThreadState {
    Initializing,
    Running,
}

#[machine]
pub struct InputThread<S: InputThreadState> {
    registry: DeviceRegistry,

    // platform side effects
    backend: Box<dyn NativeBackend>,

    commands: CommandReceiver,
    settings: NativeSettings,
}

impl<S: InputThreadState> InputThread<S> {
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    pub fn settings(&self) -> &NativeSettings {
        &self.settings
    }
}

impl InputThread<Initializing> {
    pub fn create(
        endpoint: NativeEndpoint,
        backend: Box<dyn NativeBackend>,
        settings: NativeSettings,
    ) -> Self {
        debug!(
            "Creating input thread with {} backend: {:?}",
            backend.name(),
            settings
        );
        let NativeEndpoint {
            events,
            commands,
            resource_ids,
        } = endpoint;

        Self::new(
            DeviceRegistry::new(events, resource_ids),
            backend,
            commands,
            settings,
        )
    }

    /// Runs the startup discovery pass and transitions to Running
    pub fn initialize(mut self) -> Result<InputThread<Running>, InputError> {
        if self.settings.discover_on_startup {
            info!("Discovering devices with {} backend", self.backend.name());
            if let Err(e) = self.backend.discover(&mut self.registry) {
                error!("Startup device discovery failed: {}", e);
                return Err(InputError::Initialization(e.to_string()));
            }
        }

        info!(
            "Input thread initialized with {} devices, transitioning to Running state",
            self.registry.len()
        );
        Ok(self.transition())
    }
}

impl InputThread<Running> {
    /// Executes every queued command in submission order.
    /// A failing command is logged and does not stop the ones behind it.
    pub fn run_pending_commands(&mut self) -> usize {
        let mut executed = 0;
        while let Some(command) = self.commands.try_next() {
            if let Err(e) = self
                .registry
                .execute_command(&command, self.backend.as_mut())
            {
                error!("Command {} failed: {}", command, e);
            }
            executed += 1;
        }
        executed
    }

    /// One pass: commands, discovery (while requested), then polling.
    /// A failed discovery pass is logged and polling still runs.
    pub fn tick(&mut self) -> Result<(), InputError> {
        let executed = self.run_pending_commands();
        if executed > 0 {
            debug!("Executed {} commands", executed);
        }

        if self.registry.is_discovering() {
            if let Err(e) = self.backend.discover(&mut self.registry) {
                error!("Device discovery pass failed: {}", e);
            }
        }

        self.backend.poll(&mut self.registry)
    }

    /// Blocks the calling thread, ticking every `poll_interval` until `cancel` fires
    pub fn run_until_cancelled(&mut self, cancel: &CancellationToken) {
        info!(
            "Starting input thread loop ({} ms poll interval)",
            self.settings.poll_interval_ms
        );
        let interval = self.settings.poll_interval();

        while !cancel.is_cancelled() {
            if let Err(e) = self.tick() {
                error!("Input thread tick failed: {}", e);
            }
            std::thread::sleep(interval);
        }

        // commands queued before shutdown still get applied
        self.run_pending_commands();
        info!("Input thread loop stopped");
    }

    /// Tears down the registry, posting disconnects for every remaining device
    pub fn shutdown(self) {
        info!(
            "Shutting down input thread with {} devices",
            self.registry.len()
        );
        drop(self.registry);
    }
}
