//! # Configuration Module
//!
//! Drive settings with compiled-in defaults. The program runs without any
//! file; a TOML file may override individual keys.
//!
//! ```toml
//! [board]
//! i2c_address = 0x44
//!
//! [gamepad]
//! axis_up_down = "ABS_Y"
//! axis_up_down_inverted = true
//!
//! [drive]
//! slow_factor = 0.5
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{DriveError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub motors: MotorConfig,
}

/// Motor board (I2C) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,

    #[serde(default = "default_i2c_address")]
    pub i2c_address: u16,

    /// Ignore the emergency power off latch. Needed without an EPO switch or jumper.
    #[serde(default = "default_epo_ignore")]
    pub epo_ignore: bool,
}

/// Gamepad bindings
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    /// evdev device path, empty to auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_axis_up_down")]
    pub axis_up_down: String,

    #[serde(default = "default_axis_inverted")]
    pub axis_up_down_inverted: bool,

    #[serde(default = "default_axis_left_right")]
    pub axis_left_right: String,

    #[serde(default = "default_axis_inverted")]
    pub axis_left_right_inverted: bool,

    #[serde(default = "default_button_reset_epo")]
    pub button_reset_epo: String,

    #[serde(default = "default_button_slow")]
    pub button_slow: String,

    #[serde(default = "default_button_fast_turn")]
    pub button_fast_turn: String,

    /// 0 waits for input forever
    #[serde(default)]
    pub poll_timeout_ms: u64,
}

/// Drive behaviour and power limits
#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f32,

    /// Pause between loop iterations
    #[serde(default)]
    pub interval_ms: u64,

    /// Total battery voltage into the board
    #[serde(default = "default_voltage_in")]
    pub voltage_in: f32,

    /// Maximum motor voltage
    #[serde(default = "default_voltage_out")]
    pub voltage_out: f32,
}

/// Which board channel drives which wheel
#[derive(Debug, Deserialize, Clone)]
pub struct MotorConfig {
    #[serde(default = "default_left_channel")]
    pub left_channel: u8,

    #[serde(default = "default_left_reversed")]
    pub left_reversed: bool,

    #[serde(default = "default_right_channel")]
    pub right_channel: u8,

    #[serde(default)]
    pub right_reversed: bool,
}

// Default value functions
fn default_i2c_bus() -> u8 { 1 }
fn default_i2c_address() -> u16 { 0x44 }
fn default_epo_ignore() -> bool { true }

fn default_axis_up_down() -> String { "ABS_Y".to_string() }
fn default_axis_left_right() -> String { "ABS_Z".to_string() }
fn default_axis_inverted() -> bool { true }
fn default_button_reset_epo() -> String { "BTN_TR2".to_string() }
fn default_button_slow() -> String { "BTN_TL".to_string() }
fn default_button_fast_turn() -> String { "BTN_TR".to_string() }

fn default_slow_factor() -> f32 { 0.5 }
fn default_voltage_in() -> f32 { 14.4 }
fn default_voltage_out() -> f32 { 12.0 }

fn default_left_channel() -> u8 { 2 }
fn default_left_reversed() -> bool { true }
fn default_right_channel() -> u8 { 1 }

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            i2c_address: default_i2c_address(),
            epo_ignore: default_epo_ignore(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            axis_up_down: default_axis_up_down(),
            axis_up_down_inverted: default_axis_inverted(),
            axis_left_right: default_axis_left_right(),
            axis_left_right_inverted: default_axis_inverted(),
            button_reset_epo: default_button_reset_epo(),
            button_slow: default_button_slow(),
            button_fast_turn: default_button_fast_turn(),
            poll_timeout_ms: 0,
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            slow_factor: default_slow_factor(),
            interval_ms: 0,
            voltage_in: default_voltage_in(),
            voltage_out: default_voltage_out(),
        }
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            left_channel: default_left_channel(),
            left_reversed: default_left_reversed(),
            right_channel: default_right_channel(),
            right_reversed: false,
        }
    }
}

impl GamepadConfig {
    /// Wait limit for one input batch, `None` to block until input arrives
    #[must_use]
    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_ms > 0).then(|| Duration::from_millis(self.poll_timeout_ms))
    }
}

impl DriveConfig {
    /// Pause after each loop iteration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pad_drive::config::Config;
    ///
    /// let config = Config::load("pad-drive.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns [`DriveError::InvalidConfig`] naming the first bad value
    pub fn validate(&self) -> Result<()> {
        // 7-bit I2C addresses, excluding the reserved ranges
        if !(0x03..=0x77).contains(&self.board.i2c_address) {
            return Err(invalid("i2c_address must be between 0x03 and 0x77"));
        }

        let bindings = [
            ("axis_up_down", &self.gamepad.axis_up_down),
            ("axis_left_right", &self.gamepad.axis_left_right),
            ("button_reset_epo", &self.gamepad.button_reset_epo),
            ("button_slow", &self.gamepad.button_slow),
            ("button_fast_turn", &self.gamepad.button_fast_turn),
        ];

        for (i, (name, code)) in bindings.iter().enumerate() {
            if code.is_empty() {
                return Err(invalid(format!("{} cannot be empty", name)));
            }
            if let Some((other, _)) = bindings[..i].iter().find(|(_, c)| c == code) {
                return Err(invalid(format!("{} and {} are both bound to {}", other, name, code)));
            }
        }

        if !(0.0..=1.0).contains(&self.drive.slow_factor) {
            return Err(invalid("slow_factor must be between 0.0 and 1.0"));
        }

        for (name, volts) in [
            ("voltage_in", self.drive.voltage_in),
            ("voltage_out", self.drive.voltage_out),
        ] {
            if !volts.is_finite() || volts <= 0.0 {
                return Err(invalid(format!("{} must be a finite voltage greater than 0", name)));
            }
        }

        if self.drive.interval_ms > 60000 {
            return Err(invalid("interval_ms must be between 0 and 60000"));
        }

        for (name, channel) in [
            ("left_channel", self.motors.left_channel),
            ("right_channel", self.motors.right_channel),
        ] {
            if !(1..=2).contains(&channel) {
                return Err(invalid(format!("{} must be 1 or 2", name)));
            }
        }

        if self.motors.left_channel == self.motors.right_channel {
            return Err(invalid("left_channel and right_channel must differ"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> DriveError {
    DriveError::InvalidConfig(message.into())
}
