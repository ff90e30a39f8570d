use thiserror::Error;

/// Errors surfaced by the input bus
///
/// Most failures on the bus are not errors at all: commands aimed at a vanished
/// device or events for an unknown controller are dropped and logged. What remains
/// here are failures a caller can act on.
#[derive(Debug, Error)]
pub enum InputError {
    /// A native call failed while executing a command or polling hardware
    #[error("Platform error: {0}")]
    Platform(String),

    /// The native backend could not be brought up
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Cursor pixel data does not match its declared size and format
    #[error("Invalid cursor bitmap: {0}")]
    InvalidCursorBitmap(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors while loading or validating [`crate::config::InputConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
