//! Native-owning-thread half of the input system
//!
//! Everything in here runs on the one thread allowed to touch OS input handles.
//! [`InputThread`] owns a [`DeviceRegistry`] and a [`NativeBackend`]; backends
//! report hardware through the registry's devices, and game-thread commands are
//! applied between polls.

pub mod backend;
pub mod device;
#[cfg(feature = "gilrs")]
pub mod gilrs_backend;
pub mod input_thread;
pub mod registry;
pub mod virtual_input;

pub use backend::{NativeBackend, NullBackend};
pub use device::{Device, GamepadDevice, KeyboardDevice, MouseDevice, TouchpadDevice};
#[cfg(feature = "gilrs")]
pub use gilrs_backend::GilrsBackend;
pub use input_thread::{InputThread, InputThreadState, Initializing, Running};
pub use registry::{CursorResource, DeviceRegistry};
pub use virtual_input::{VirtualBackend, VirtualInput, VirtualOccurrence};
