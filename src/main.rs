//! # Pad Drive
//!
//! Drive a two-motor robot with a gamepad through a PicoBorg Reverse board.
//!
//! This application reads the gamepad through evdev and writes differential
//! drive power to the motor board over I2C until interrupted.

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber;

use pad_drive::config::Config;
use pad_drive::control::{device_not_found_report, ReadyBoard};
use pad_drive::error::DriveError;
use pad_drive::gamepad::device::Gamepad;
use pad_drive::motor::bus::RppalBus;
use pad_drive::motor::picoborg::PicoBorgReverse;

/// Main entry point for Pad Drive application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or built-in defaults)
///    - Probe and configure the motor board
///    - Open the gamepad
///
/// 2. **Main Loop**
///    - Turn each batch of gamepad events into motor power
///    - Handle Ctrl+C for shutdown
///
/// 3. **Shutdown**
///    - Turn all motors off
///    - Clean exit
///
/// # Errors
///
/// Exits with status 1 if:
/// - The configuration file is invalid
/// - No motor board is found (checked before the gamepad)
/// - No gamepad is found
/// - The board or gamepad fails while driving
///
/// # Examples
///
/// ```bash
/// cargo run --release -- pad-drive.toml
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Pad Drive v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args_os().nth(1);
    let config = Config::load_or_default(config_path.as_ref())?;
    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.to_string_lossy()),
        None => info!("Using built-in configuration"),
    }

    let bus = RppalBus::open(config.board.i2c_bus)?;
    let board = PicoBorgReverse::new(bus, config.board.i2c_address);

    let board = match ReadyBoard::init(board, &config) {
        Ok(board) => board,
        Err(DriveError::DeviceNotFound { address, discovered }) => {
            error!("Motor board not found at {:#04X}", address);
            eprintln!("{}", device_not_found_report(address, &discovered));
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let gamepad = Gamepad::open(&config.gamepad.device_path, &config.gamepad.axis_up_down)?;
    info!(
        "Gamepad {} at {}",
        gamepad.name().unwrap_or("(unnamed)"),
        gamepad.device_path()
    );
    let drive = board.with_source(gamepad.into_source()?);

    info!("Press Ctrl+C to quit");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };
    drive.run_until(shutdown).await?;

    info!("Motors off, exiting");
    Ok(())
}
