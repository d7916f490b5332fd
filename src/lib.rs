//! # Pad Drive Library
//!
//! Drive a two-motor robot with a gamepad through a PicoBorg Reverse board.
//!
//! This library provides the gamepad input handling, the differential
//! steering arithmetic, the motor board driver and the control loop that
//! ties them together.

pub mod config;
pub mod control;
pub mod drive;
pub mod error;
pub mod gamepad;
pub mod motor;
