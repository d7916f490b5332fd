//! # Error Types
//!
//! Custom error types for Pad Drive using `thiserror`.

use thiserror::Error;

/// Main error type for Pad Drive
#[derive(Debug, Error)]
pub enum DriveError {
    /// No motor board answered at the configured I2C address
    #[error("no PicoBorg Reverse at address {address:#04X} ({} other board(s) found)", discovered.len())]
    DeviceNotFound {
        /// Address that was probed
        address: u16,
        /// Addresses where a board did answer during the bus scan
        discovered: Vec<u16>,
    },

    /// I2C bus errors
    #[error("I2C error: {0}")]
    I2c(String),

    /// Motor board replied to a read with an unexpected command byte
    #[error("unexpected response to command {command:#04X}: got {received:#04X}")]
    BadResponse {
        /// Command that was sent
        command: u8,
        /// First byte of the reply
        received: u8,
    },

    /// No usable gamepad found
    #[error("no gamepad found with axis {0}")]
    GamepadNotFound(String),

    /// Gamepad read errors
    #[error("Gamepad error: {0}")]
    Gamepad(String),

    /// Configuration parse errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Pad Drive
pub type Result<T> = std::result::Result<T, DriveError>;
