//! # Drive Module
//!
//! Gamepad-to-wheel arithmetic, free of any I/O.
//!
//! This module handles:
//! - Normalizing raw axis readings with a rest band
//! - Folding input events into steering state
//! - Differential steering and power limiting

pub mod axis;
pub mod mixer;
pub mod state;
