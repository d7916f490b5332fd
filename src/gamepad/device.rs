//! # Gamepad Device Module
//!
//! Finds a gamepad through the Linux evdev interface and reads its events
//! in batches.
//!
//! ## Device Selection
//!
//! With a configured device path that device is opened directly.
//! Otherwise `/dev/input/event*` devices are scanned in sorted order and
//! the first one reporting the forward/back axis is used.

use async_trait::async_trait;
use evdev::{Device, EventStream};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use super::event::{EventBatcher, InputEvent, InputSource};
use crate::error::{DriveError, Result};

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// Gamepad handle
///
/// An opened evdev device that has not started streaming yet.
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.device.name())
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Open the gamepad
    ///
    /// # Arguments
    ///
    /// * `device_path` - evdev path, or empty to auto-detect
    /// * `required_axis` - Axis code the device must report when auto-detecting
    ///
    /// # Errors
    ///
    /// - `GamepadNotFound`: no device reports `required_axis`
    /// - `Gamepad`: the configured path cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pad_drive::gamepad::device::Gamepad;
    ///
    /// let gamepad = Gamepad::open("", "ABS_Y")?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: &str, required_axis: &str) -> Result<Self> {
        if device_path.is_empty() {
            Self::detect(Path::new(INPUT_DIR), required_axis)
        } else {
            Self::open_path(Path::new(device_path))
        }
    }

    fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            DriveError::Gamepad(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let device_path = path.to_string_lossy().to_string();
        info!(
            "Opened gamepad {} at: {}",
            device.name().unwrap_or("(unnamed)"),
            device_path
        );

        Ok(Self {
            device,
            device_path,
        })
    }

    fn detect(input_dir: &Path, required_axis: &str) -> Result<Self> {
        if !input_dir.exists() {
            return Err(DriveError::Gamepad(format!(
                "{} directory not found",
                input_dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
            .map_err(|e| {
                DriveError::Gamepad(format!("Failed to read {}: {}", input_dir.display(), e))
            })?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        // Deterministic pick when several pads are connected
        paths.sort();

        for path in paths {
            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if reports_axis(&device, required_axis) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad {} at: {}",
                            device.name().unwrap_or("(unnamed)"),
                            device_path
                        );
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(DriveError::GamepadNotFound(required_axis.to_string()))
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the gamepad name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Start streaming events
    ///
    /// # Errors
    ///
    /// Returns `Gamepad` error if the device cannot be switched to
    /// non-blocking mode.
    pub fn into_source(self) -> Result<GamepadSource> {
        let device_path = self.device_path;
        let stream = self.device.into_event_stream().map_err(|e| {
            DriveError::Gamepad(format!("Failed to stream {}: {}", device_path, e))
        })?;

        Ok(GamepadSource {
            stream,
            batcher: EventBatcher::default(),
        })
    }
}

fn reports_axis(device: &Device, code: &str) -> bool {
    device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.iter().any(|axis| format!("{:?}", axis) == code))
}

/// Streaming gamepad, the production [`InputSource`].
///
/// Cancel safe: a partly read batch is kept for the next poll.
pub struct GamepadSource {
    stream: EventStream,
    batcher: EventBatcher,
}

#[async_trait]
impl InputSource for GamepadSource {
    async fn poll(&mut self) -> Result<Vec<InputEvent>> {
        loop {
            let event = self.stream.next_event().await.map_err(|e| {
                DriveError::Gamepad(format!("Failed to fetch events: {}", e))
            })?;

            if let Some(batch) = self.batcher.push(&event) {
                trace!("Input batch of {} event(s)", batch.len());
                return Ok(batch);
            }
        }
    }
}
