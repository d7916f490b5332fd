//! # Control Loop Module
//!
//! Ties the gamepad to the motor board.
//!
//! ## Startup
//!
//! 1. Probe the board; when it is missing, scan the bus and fail with
//!    [`DriveError::DeviceNotFound`] listing what was found. This runs in
//!    [`ReadyBoard::init`], before any input source exists
//! 2. Apply the EPO ignore setting and disable the communications failsafe,
//!    so waiting on the gamepad never trips a cutoff
//! 3. Reset the EPO latch and turn all motors off
//!
//! ## Each Tick
//!
//! 1. Wait for one batch of input events (the only suspension point)
//! 2. Fold recognized events into the steering state, resetting the EPO
//!    latch immediately on each EPO reset button event
//! 3. Mix wheel power, applying the slow factor when a slow button event
//!    arrived in this batch
//! 4. Write both motor channels, even when nothing changed
//! 5. Mirror the EPO latch on the board LED
//! 6. Sleep the configured interval
//!
//! ## Shutdown
//!
//! When the shutdown future resolves (Ctrl+C in the binary) all motors are
//! turned off once and the loop returns `Ok(())`. A board or gamepad error
//! also turns the motors off before it is returned.

use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::drive::mixer::{DriveMixer, MotorCommand, PowerLimits};
use crate::drive::state::{InputAction, SteeringMapper};
use crate::error::{DriveError, Result};
use crate::gamepad::event::{InputEvent, InputSource};
use crate::motor::{MotorController, MotorWiring};

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 1000;

/// Control loop state, owned by the running task.
pub struct ControlLoop<M: MotorController, S: InputSource> {
    controller: M,
    source: S,
    mapper: SteeringMapper,
    mixer: DriveMixer,
    wiring: MotorWiring,
    interval: Duration,
    poll_timeout: Option<Duration>,
    last_command: MotorCommand,
    tick_count: u64,
}

impl<M: MotorController, S: InputSource> std::fmt::Debug for ControlLoop<M, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("state", self.mapper.state())
            .field("last_command", &self.last_command)
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}

/// Motor board that has been probed, configured and stopped, waiting for
/// an input source.
pub struct ReadyBoard<M: MotorController> {
    controller: M,
    mapper: SteeringMapper,
    mixer: DriveMixer,
    wiring: MotorWiring,
    interval: Duration,
    poll_timeout: Option<Duration>,
}

impl<M: MotorController> std::fmt::Debug for ReadyBoard<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyBoard")
            .field("wiring", &self.wiring)
            .finish_non_exhaustive()
    }
}

impl<M: MotorController> ReadyBoard<M> {
    /// Initialize the board.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound`: the board did not answer at its address
    /// - `InvalidConfig`: motor channel assignment is invalid
    /// - Any board error raised while configuring it
    pub fn init(mut controller: M, config: &Config) -> Result<Self> {
        let wiring = MotorWiring::from_config(&config.motors)?;

        if !controller.init()? {
            let discovered = controller.scan()?;
            return Err(DriveError::DeviceNotFound {
                address: controller.address(),
                discovered,
            });
        }

        controller.set_epo_ignore(config.board.epo_ignore)?;
        controller.set_comms_failsafe(false)?;
        controller.reset_epo()?;
        controller.motors_off()?;

        if controller.get_drive_fault()? {
            warn!("Motor board reports a drive fault");
        }

        let limits = PowerLimits::from_voltages(config.drive.voltage_in, config.drive.voltage_out);
        info!(
            "Power limited to {:.1}% ({}V battery, {}V motors)",
            limits.max_power() * 100.0,
            config.drive.voltage_in,
            config.drive.voltage_out
        );

        Ok(Self {
            controller,
            mapper: SteeringMapper::new(&config.gamepad),
            mixer: DriveMixer::new(limits, config.drive.slow_factor),
            wiring,
            interval: config.drive.interval(),
            poll_timeout: config.gamepad.poll_timeout(),
        })
    }

    /// Attach the input source, producing a loop ready to run.
    pub fn with_source<S: InputSource>(self, source: S) -> ControlLoop<M, S> {
        ControlLoop {
            controller: self.controller,
            source,
            mapper: self.mapper,
            mixer: self.mixer,
            wiring: self.wiring,
            interval: self.interval,
            poll_timeout: self.poll_timeout,
            last_command: MotorCommand::STOP,
            tick_count: 0,
        }
    }
}

impl<M: MotorController, S: InputSource> ControlLoop<M, S> {
    /// Initialize the board and attach `source` in one step.
    ///
    /// # Errors
    ///
    /// Same as [`ReadyBoard::init`].
    pub fn start(controller: M, source: S, config: &Config) -> Result<Self> {
        Ok(ReadyBoard::init(controller, config)?.with_source(source))
    }

    /// Last command written to the motors.
    pub fn last_command(&self) -> MotorCommand {
        self.last_command
    }

    /// Run until `shutdown` resolves, then turn the motors off.
    ///
    /// # Errors
    ///
    /// Returns the first board or gamepad error. The motors are turned off
    /// before it is returned.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Starting drive loop");

        let outcome = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Received Ctrl+C, shutting down...");
                    break Ok(());
                }

                result = self.tick() => {
                    if let Err(e) = result {
                        error!("Drive loop failed: {}", e);
                        break Err(e);
                    }
                }
            }
        };

        info!("Total ticks: {}", self.tick_count);

        match (outcome, self.controller.motors_off()) {
            (Ok(()), off) => off,
            (Err(e), Err(off_error)) => {
                warn!("Failed to turn motors off: {}", off_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    /// One loop iteration.
    ///
    /// # Errors
    ///
    /// Returns gamepad read errors and board write errors.
    pub async fn tick(&mut self) -> Result<MotorCommand> {
        let batch = self.next_batch().await?;
        let command = self.apply_batch(&batch)?;

        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        Ok(command)
    }

    async fn next_batch(&mut self) -> Result<Vec<InputEvent>> {
        match self.poll_timeout {
            None => self.source.poll().await,
            Some(limit) => match tokio::time::timeout(limit, self.source.poll()).await {
                Ok(batch) => batch,
                Err(_) => {
                    debug!("No input within {:?}", limit);
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Fold a batch into the steering state and write the motors.
    ///
    /// # Errors
    ///
    /// Returns board write errors.
    pub fn apply_batch(&mut self, batch: &[InputEvent]) -> Result<MotorCommand> {
        let mut slow = false;

        for event in batch {
            match self.mapper.process_event(event) {
                Some(InputAction::ResetEpo) => {
                    info!("EPO reset requested");
                    self.controller.reset_epo()?;
                }
                Some(InputAction::Slow) => {
                    debug!("Slow");
                    slow = true;
                }
                Some(InputAction::FastTurn) => debug!("FastTurn"),
                Some(InputAction::ForwardBack | InputAction::LeftRight) | None => {}
            }
        }

        let command = self.mixer.command(self.mapper.state(), slow);
        for (channel, power) in self.wiring.outputs(command) {
            self.controller.set_motor(channel, power)?;
        }

        let epo = self.controller.get_epo()?;
        self.controller.set_led(epo)?;

        if command != self.last_command {
            debug!("Motors: left {:.3}, right {:.3}", command.left, command.right);
        }
        self.last_command = command;
        self.tick_count += 1;

        if self.tick_count % LOG_INTERVAL_TICKS == 0 {
            info!(
                "Processed {} ticks (left {:.2}, right {:.2}, EPO {})",
                self.tick_count,
                command.left,
                command.right,
                if epo { "tripped" } else { "clear" }
            );
        }

        Ok(command)
    }
}

/// Text shown when the board is missing.
///
/// # Examples
///
/// ```
/// use pad_drive::control::device_not_found_report;
///
/// let report = device_not_found_report(0x44, &[]);
/// assert_eq!(report, "No PicoBorg Reverse found, check you are attached :)");
/// ```
#[must_use]
pub fn device_not_found_report(address: u16, discovered: &[u16]) -> String {
    let Some(first) = discovered.first() else {
        return "No PicoBorg Reverse found, check you are attached :)".to_string();
    };

    let mut report = format!(
        "No PicoBorg Reverse at address {:02X}, but we did find boards:",
        address
    );
    for board in discovered {
        let _ = write!(report, "\n    {:02X} ({})", board, board);
    }
    let _ = write!(
        report,
        "\nIf you need to change the I2C address set it in the config, e.g.\n[board]\ni2c_address = 0x{:02X}",
        first
    );
    report
}
