//! # Axis Normalization Module
//!
//! Converts raw 8-bit gamepad axis readings into normalized drive values.
//!
//! ## Rest Band
//!
//! Cheap pads rarely rest exactly on 127/128, so raw values from 125 to 130
//! inclusive are treated as centered and map to exactly 0.0. Outside the
//! band the distance from the nearest band edge is divided by 125:
//!
//! | Raw | Normalized |
//! |-----|------------|
//! | 0 | 1.0 |
//! | 125..=130 | 0.0 |
//! | 255 | -1.0 |
//!
//! Pushing a stick up (towards raw 0) therefore gives a positive value
//! before inversion.
//!
//! ## Usage
//!
//! ```
//! use pad_drive::drive::axis::AxisMapping;
//!
//! let axis = AxisMapping::new(true);
//! assert_eq!(axis.apply(0), -1.0);
//! assert_eq!(axis.apply(128), 0.0);
//! ```

/// Raw axis value range from the gamepad.
pub const AXIS_MIN: i32 = 0;
/// Raw axis value range from the gamepad.
pub const AXIS_MAX: i32 = 255;

/// Lowest raw value inside the rest band.
pub const REST_BAND_LOW: i32 = 125;
/// Highest raw value inside the rest band.
pub const REST_BAND_HIGH: i32 = 130;

/// Distance from the rest band to either end of the raw range.
const AXIS_SPAN: f32 = 125.0;

/// Converts a raw axis value (0-255) to a normalized value (-1.0 to 1.0).
///
/// Inputs outside 0-255 are clamped first.
///
/// # Examples
///
/// ```
/// use pad_drive::drive::axis::normalize_axis;
///
/// assert_eq!(normalize_axis(0), 1.0);
/// assert_eq!(normalize_axis(127), 0.0);
/// assert_eq!(normalize_axis(255), -1.0);
/// ```
#[must_use]
pub fn normalize_axis(raw: i32) -> f32 {
    let raw = raw.clamp(AXIS_MIN, AXIS_MAX);

    let offset = if raw > REST_BAND_HIGH {
        REST_BAND_HIGH - raw
    } else if raw < REST_BAND_LOW {
        REST_BAND_LOW - raw
    } else {
        0
    };

    offset as f32 / AXIS_SPAN
}

/// Normalization for one bound axis, with its own inversion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMapping {
    inverted: bool,
}

impl AxisMapping {
    /// Creates an axis mapping.
    ///
    /// # Arguments
    ///
    /// * `inverted` - Negate the normalized value (for pads whose axis runs backwards)
    #[must_use]
    pub fn new(inverted: bool) -> Self {
        Self { inverted }
    }

    /// Returns whether the axis is inverted.
    #[must_use]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Normalizes a raw reading and applies the inversion flag.
    #[must_use]
    pub fn apply(&self, raw: i32) -> f32 {
        let value = normalize_axis(raw);
        if self.inverted {
            -value
        } else {
            value
        }
    }
}
