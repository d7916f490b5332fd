//! # Motor Board Module
//!
//! Two-channel motor controller boundary.
//!
//! This module handles:
//! - The [`MotorController`] trait the control loop drives
//! - PicoBorg Reverse register protocol over I2C
//! - Bus scanning when the board is missing
//! - Mapping left/right wheel power onto board channels

pub mod bus;
pub mod picoborg;

use crate::config::MotorConfig;
use crate::drive::mixer::MotorCommand;
use crate::error::{DriveError, Result};

/// Motor output on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorChannel {
    /// Motor 1, the board's drive B
    One = 1,
    /// Motor 2, the board's drive A
    Two = 2,
}

impl TryFrom<u8> for MotorChannel {
    type Error = DriveError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(DriveError::InvalidConfig(format!(
                "motor channel must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Operations the control loop needs from a motor board.
#[cfg_attr(test, mockall::automock)]
pub trait MotorController {
    /// Probe the board, returning whether it answered.
    fn init(&mut self) -> Result<bool>;

    /// Address the board is expected at.
    fn address(&self) -> u16;

    /// Addresses on the bus where a compatible board answered.
    fn scan(&mut self) -> Result<Vec<u16>>;

    /// Let the motors run while the EPO latch is tripped.
    fn set_epo_ignore(&mut self, ignore: bool) -> Result<()>;

    /// Enable the board's cutoff when commands stop arriving.
    fn set_comms_failsafe(&mut self, enabled: bool) -> Result<()>;

    /// Clear the emergency power off latch.
    fn reset_epo(&mut self) -> Result<()>;

    /// Whether the emergency power off latch has tripped.
    fn get_epo(&mut self) -> Result<bool>;

    /// Switch the board LED.
    fn set_led(&mut self, on: bool) -> Result<()>;

    /// Drive one channel, `power` in -1.0 to 1.0.
    fn set_motor(&mut self, channel: MotorChannel, power: f32) -> Result<()>;

    /// Stop both channels.
    fn motors_off(&mut self) -> Result<()>;

    /// Whether the drive reports a fault (e.g. over-temperature).
    fn get_drive_fault(&mut self) -> Result<bool>;
}

/// Which channel and polarity each wheel is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorWiring {
    left: MotorChannel,
    left_reversed: bool,
    right: MotorChannel,
    right_reversed: bool,
}

impl Default for MotorWiring {
    fn default() -> Self {
        Self {
            left: MotorChannel::Two,
            left_reversed: true,
            right: MotorChannel::One,
            right_reversed: false,
        }
    }
}

impl MotorWiring {
    /// Builds the wiring from config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a channel other than 1 or 2, or when both
    /// wheels share a channel.
    pub fn from_config(config: &MotorConfig) -> Result<Self> {
        let left = MotorChannel::try_from(config.left_channel)?;
        let right = MotorChannel::try_from(config.right_channel)?;
        if left == right {
            return Err(DriveError::InvalidConfig(
                "left and right wheels share a channel".to_string(),
            ));
        }

        Ok(Self {
            left,
            left_reversed: config.left_reversed,
            right,
            right_reversed: config.right_reversed,
        })
    }

    /// Per-channel power for a wheel command, in channel order.
    #[must_use]
    pub fn outputs(&self, command: MotorCommand) -> [(MotorChannel, f32); 2] {
        let left = (self.left, polarity(command.left, self.left_reversed));
        let right = (self.right, polarity(command.right, self.right_reversed));

        if self.left == MotorChannel::One {
            [left, right]
        } else {
            [right, left]
        }
    }
}

fn polarity(power: f32, reversed: bool) -> f32 {
    if reversed {
        -power
    } else {
        power
    }
}
