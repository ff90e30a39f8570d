//! Input event/command bus between a native input thread and a game thread
//!
//! ```text
//! InputThread (native) ──[InputEvent + completion]──► ControllerManager (game)
//!          ▲                                                   │
//!          └──────────────────[Command]────────────────────────┘
//! ```
//!
//! [`bus::connect`] creates both endpoints. The native endpoint drives an
//! [`native::InputThread`] that owns OS handles through a [`native::NativeBackend`];
//! the game endpoint feeds a [`controller::ControllerManager`] that turns events
//! into [`controller::ApplicationEvent`]s.

pub mod bus;
pub mod config;
pub mod controller;
pub mod error;
pub mod native;
pub mod types;

pub use error::{ConfigError, InputError};
