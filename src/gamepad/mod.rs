//! # Gamepad Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Converting raw events to symbolic codes
//! - Batching events up to each sync report

pub mod device;
pub mod event;
