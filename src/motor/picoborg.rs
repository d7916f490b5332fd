//! # PicoBorg Reverse Driver
//!
//! Register protocol for the PiBorg PicoBorg Reverse dual motor board.
//!
//! Every command is a write of `[command, value]`. Reads write the bare
//! command byte, then read a fixed 4-byte reply whose first byte echoes the
//! command and whose second byte carries the value.
//!
//! Motor 1 is the board's drive B and motor 2 its drive A.

use tracing::{debug, info, trace, warn};

use super::bus::I2cBus;
use super::{MotorChannel, MotorController};
use crate::error::{DriveError, Result};

/// Factory default board address
pub const DEFAULT_I2C_ADDRESS: u16 = 0x44;

/// Value the board returns for the ID command
pub const BOARD_ID: u8 = 0x15;

/// Full-scale PWM value
pub const PWM_MAX: f32 = 255.0;

/// Reply length for every read command
const READ_LEN: usize = 4;

/// Address range probed by [`PicoBorgReverse::scan`]
const SCAN_FIRST: u16 = 0x03;
const SCAN_LAST: u16 = 0x77;

const VALUE_ON: u8 = 1;
const VALUE_OFF: u8 = 0;

/// Command bytes.
pub mod command {
    pub const SET_LED: u8 = 1;
    pub const SET_A_FWD: u8 = 3;
    pub const SET_A_REV: u8 = 4;
    pub const SET_B_FWD: u8 = 6;
    pub const SET_B_REV: u8 = 7;
    pub const ALL_OFF: u8 = 9;
    pub const RESET_EPO: u8 = 10;
    pub const GET_EPO: u8 = 11;
    pub const SET_EPO_IGNORE: u8 = 12;
    pub const GET_DRIVE_FAULT: u8 = 14;
    pub const SET_FAILSAFE: u8 = 17;
    pub const GET_ID: u8 = 0x99;
}

/// Converts motor power (-1.0 to 1.0) to a direction flag and PWM duty.
///
/// Out-of-range power is clamped. Returns `(reverse, pwm)`.
///
/// # Examples
///
/// ```
/// use pad_drive::motor::picoborg::power_to_pwm;
///
/// assert_eq!(power_to_pwm(1.0), (false, 255));
/// assert_eq!(power_to_pwm(-0.5), (true, 127));
/// assert_eq!(power_to_pwm(0.0), (false, 0));
/// ```
#[must_use]
pub fn power_to_pwm(power: f32) -> (bool, u8) {
    let power = power.clamp(-1.0, 1.0);
    let pwm = (PWM_MAX * power.abs()) as u8;
    (power < 0.0, pwm)
}

/// PicoBorg Reverse board handle
pub struct PicoBorgReverse<B: I2cBus> {
    bus: B,
    address: u16,
}

impl<B: I2cBus> std::fmt::Debug for PicoBorgReverse<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PicoBorgReverse")
            .field("address", &format_args!("{:#04X}", self.address))
            .finish_non_exhaustive()
    }
}

impl<B: I2cBus> PicoBorgReverse<B> {
    /// Create a handle for the board at `address`. Nothing is sent until
    /// [`MotorController::init`].
    pub fn new(bus: B, address: u16) -> Self {
        Self { bus, address }
    }

    fn write(&mut self, command: u8, value: u8) -> Result<()> {
        trace!("PBR write {:#04X} {:#04X}", command, value);
        self.bus.write(&[command, value])
    }

    fn write_flag(&mut self, command: u8, on: bool) -> Result<()> {
        self.write(command, if on { VALUE_ON } else { VALUE_OFF })
    }

    fn read(&mut self, command: u8) -> Result<[u8; READ_LEN]> {
        self.bus.write(&[command])?;

        let mut reply = [0u8; READ_LEN];
        self.bus.read(&mut reply)?;

        if reply[0] != command {
            return Err(DriveError::BadResponse {
                command,
                received: reply[0],
            });
        }
        Ok(reply)
    }

    fn read_flag(&mut self, command: u8) -> Result<bool> {
        Ok(self.read(command)?[1] != VALUE_OFF)
    }

    /// Whether the selected address answers with the board ID.
    fn probe(&mut self) -> bool {
        match self.read(command::GET_ID) {
            Ok(reply) => reply[1] == BOARD_ID,
            Err(e) => {
                trace!("No board ID: {}", e);
                false
            }
        }
    }
}

impl<B: I2cBus> MotorController for PicoBorgReverse<B> {
    fn init(&mut self) -> Result<bool> {
        self.bus.set_address(self.address)?;

        let found = self.probe();
        if found {
            info!("Found PicoBorg Reverse at {:#04X}", self.address);
        } else {
            warn!("Missing PicoBorg Reverse at {:#04X}", self.address);
        }
        Ok(found)
    }

    fn address(&self) -> u16 {
        self.address
    }

    fn scan(&mut self) -> Result<Vec<u16>> {
        info!("Scanning I2C bus for PicoBorg Reverse boards");
        let mut found = Vec::new();

        for address in SCAN_FIRST..=SCAN_LAST {
            if let Err(e) = self.bus.set_address(address) {
                debug!("Cannot select {:#04X}: {}", address, e);
                continue;
            }
            if self.probe() {
                info!("Found PicoBorg Reverse at {:#04X}", address);
                found.push(address);
            }
        }

        self.bus.set_address(self.address)?;

        match found.len() {
            0 => info!("No PicoBorg Reverse boards found"),
            1 => info!("1 PicoBorg Reverse board found"),
            n => info!("{} PicoBorg Reverse boards found", n),
        }
        Ok(found)
    }

    fn set_epo_ignore(&mut self, ignore: bool) -> Result<()> {
        self.write_flag(command::SET_EPO_IGNORE, ignore)
    }

    fn set_comms_failsafe(&mut self, enabled: bool) -> Result<()> {
        self.write_flag(command::SET_FAILSAFE, enabled)
    }

    fn reset_epo(&mut self) -> Result<()> {
        self.write(command::RESET_EPO, 0)
    }

    fn get_epo(&mut self) -> Result<bool> {
        self.read_flag(command::GET_EPO)
    }

    fn set_led(&mut self, on: bool) -> Result<()> {
        self.write_flag(command::SET_LED, on)
    }

    fn set_motor(&mut self, channel: MotorChannel, power: f32) -> Result<()> {
        let (reverse, pwm) = power_to_pwm(power);
        let command = match (channel, reverse) {
            (MotorChannel::One, false) => command::SET_B_FWD,
            (MotorChannel::One, true) => command::SET_B_REV,
            (MotorChannel::Two, false) => command::SET_A_FWD,
            (MotorChannel::Two, true) => command::SET_A_REV,
        };
        self.write(command, pwm)
    }

    fn motors_off(&mut self) -> Result<()> {
        self.write(command::ALL_OFF, 0)
    }

    fn get_drive_fault(&mut self) -> Result<bool> {
        self.read_flag(command::GET_DRIVE_FAULT)
    }
}
