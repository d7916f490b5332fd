//! # Differential Drive Mixer Module
//!
//! Turns the steering state into left/right wheel power.
//!
//! Both wheels start from the forward/back value. Steering past the
//! deadzone scales the inside wheel only:
//!
//! | left_right | left wheel | right wheel |
//! |------------|------------|-------------|
//! | < -0.05 | `-fb * (1 + 2 * lr)` | `-fb` |
//! | -0.05..=0.05 | `-fb` | `-fb` |
//! | > 0.05 | `-fb` | `-fb * (1 - 2 * lr)` |
//!
//! At half deflection the inside wheel stops; at full deflection it runs
//! in reverse at full speed, spinning the robot on the spot.
//!
//! ## Usage
//!
//! ```
//! use pad_drive::drive::mixer::{mix, DriveMixer, PowerLimits};
//! use pad_drive::drive::state::SteeringState;
//!
//! let command = mix(-1.0, 0.0);
//! assert_eq!((command.left, command.right), (1.0, 1.0));
//!
//! let mixer = DriveMixer::new(PowerLimits::from_voltages(14.4, 12.0), 0.5);
//! let state = SteeringState { forward_back: -1.0, left_right: 0.0 };
//! let scaled = mixer.command(&state, true);
//! assert!((scaled.left - 0.5 * 12.0 / 14.4).abs() < 1e-6);
//! ```

use super::state::SteeringState;

/// Steering values within this distance of center do not turn.
pub const STEERING_DEADZONE: f32 = 0.05;

/// Factor applied to the steering value by each fast-turn event.
pub const FAST_TURN_FACTOR: f32 = 0.5;

/// Left/right wheel power.
///
/// Positive values drive the wheel forwards. Motor wiring polarity is
/// handled when the command is written to the board, not here.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommand {
    /// Left wheel power
    pub left: f32,
    /// Right wheel power
    pub right: f32,
}

impl MotorCommand {
    /// Command with both wheels stopped.
    pub const STOP: Self = Self { left: 0.0, right: 0.0 };

    /// Multiplies both wheels by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// Output ceiling derived from the supply and motor voltages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLimits {
    max_power: f32,
}

impl Default for PowerLimits {
    fn default() -> Self {
        Self { max_power: 1.0 }
    }
}

impl PowerLimits {
    /// Limits the output so the motors never see more than `voltage_out`.
    ///
    /// # Arguments
    ///
    /// * `voltage_in` - Battery voltage feeding the board
    /// * `voltage_out` - Rated motor voltage
    ///
    /// # Examples
    ///
    /// ```
    /// use pad_drive::drive::mixer::PowerLimits;
    ///
    /// assert_eq!(PowerLimits::from_voltages(6.0, 12.0).max_power(), 1.0);
    /// assert!((PowerLimits::from_voltages(14.4, 12.0).max_power() - 0.8333).abs() < 1e-3);
    /// ```
    #[must_use]
    pub fn from_voltages(voltage_in: f32, voltage_out: f32) -> Self {
        let max_power = if voltage_out > voltage_in {
            1.0
        } else {
            voltage_out / voltage_in
        };

        Self {
            max_power: max_power.clamp(0.0, 1.0),
        }
    }

    /// Returns the maximum power fraction (0.0 to 1.0).
    #[must_use]
    pub fn max_power(&self) -> f32 {
        self.max_power
    }
}

/// Computes unscaled wheel power from forward/back and left/right values.
///
/// # Examples
///
/// ```
/// use pad_drive::drive::mixer::mix;
///
/// // Full right while reversing: right wheel runs the other way
/// let command = mix(1.0, 1.0);
/// assert_eq!(command.left, -1.0);
/// assert_eq!(command.right, 1.0);
/// ```
#[must_use]
pub fn mix(forward_back: f32, left_right: f32) -> MotorCommand {
    let mut left = -forward_back;
    let mut right = -forward_back;

    if left_right < -STEERING_DEADZONE {
        left *= 1.0 + 2.0 * left_right;
    } else if left_right > STEERING_DEADZONE {
        right *= 1.0 - 2.0 * left_right;
    }

    MotorCommand { left, right }
}

/// Applies the slow modifier and power limit on top of [`mix`].
#[derive(Debug, Clone, Copy)]
pub struct DriveMixer {
    limits: PowerLimits,
    slow_factor: f32,
}

impl DriveMixer {
    /// Mixer scaling by `limits` and slowing by `slow_factor`.
    #[must_use]
    pub fn new(limits: PowerLimits, slow_factor: f32) -> Self {
        Self { limits, slow_factor }
    }

    /// Power limits applied to every command.
    #[must_use]
    pub fn limits(&self) -> PowerLimits {
        self.limits
    }

    /// Wheel power for the current state, in `[-max_power, max_power]`.
    ///
    /// # Arguments
    ///
    /// * `state` - Current steering state
    /// * `slow` - Whether a slow-button event arrived this tick
    #[must_use]
    pub fn command(&self, state: &SteeringState, slow: bool) -> MotorCommand {
        let mut command = mix(state.forward_back, state.left_right);
        if slow {
            command = command.scaled(self.slow_factor);
        }
        command.scaled(self.limits.max_power())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    // ==================== mix Tests ====================

    #[test]
    fn test_straight_has_no_differential() {
        for f in [-1.0, -0.5, 0.0, 0.3, 1.0] {
            let command = mix(f, 0.0);
            assert_eq!(command.left, -f);
            assert_eq!(command.right, -f);
        }
    }

    #[test]
    fn test_steering_deadzone() {
        for lr in [-0.05, -0.02, 0.02, 0.05] {
            let command = mix(-0.8, lr);
            assert_eq!(command, MotorCommand { left: 0.8, right: 0.8 }, "lr {}", lr);
        }
    }

    #[test]
    fn test_full_left_reverses_left_wheel() {
        let command = mix(-1.0, -1.0);
        assert_eq!(command.left, -1.0);
        assert_eq!(command.right, 1.0);
    }

    #[test]
    fn test_full_right_reverses_right_wheel() {
        let command = mix(-1.0, 1.0);
        assert_eq!(command.left, 1.0);
        assert_eq!(command.right, -1.0);
    }

    #[test]
    fn test_half_turn_stops_inside_wheel() {
        let left_turn = mix(-1.0, -0.5);
        assert_close(left_turn.left, 0.0);
        assert_eq!(left_turn.right, 1.0);

        let right_turn = mix(-1.0, 0.5);
        assert_eq!(right_turn.left, 1.0);
        assert_close(right_turn.right, 0.0);
    }

    #[test]
    fn test_gentle_turn_slows_inside_wheel() {
        let command = mix(-1.0, 0.25);
        assert_eq!(command.left, 1.0);
        assert_close(command.right, 0.5);
    }

    #[test]
    fn test_stationary_stays_stationary_when_steering() {
        assert_eq!(mix(0.0, -1.0).left.abs(), 0.0);
        assert_eq!(mix(0.0, 1.0).right.abs(), 0.0);
    }

    #[test]
    fn test_output_stays_normalized() {
        let values = [-1.0, -0.75, -0.5, -0.06, 0.0, 0.06, 0.5, 0.75, 1.0];
        for &f in &values {
            for &lr in &values {
                let command = mix(f, lr);
                assert!((-1.0..=1.0).contains(&command.left));
                assert!((-1.0..=1.0).contains(&command.right));
            }
        }
    }

    // ==================== PowerLimits Tests ====================

    #[test]
    fn test_power_limits_ratio() {
        let limits = PowerLimits::from_voltages(12.0, 6.0);
        assert_close(limits.max_power(), 0.5);
    }

    #[test]
    fn test_power_limits_capped_at_one() {
        assert_eq!(PowerLimits::from_voltages(9.0, 12.0).max_power(), 1.0);
        assert_eq!(PowerLimits::from_voltages(12.0, 12.0).max_power(), 1.0);
        assert_eq!(PowerLimits::default().max_power(), 1.0);
    }

    // ==================== DriveMixer Tests ====================

    #[test]
    fn test_mixer_applies_power_limit() {
        let mixer = DriveMixer::new(PowerLimits::from_voltages(12.0, 6.0), 0.5);
        let state = SteeringState { forward_back: -1.0, left_right: 0.0 };

        let command = mixer.command(&state, false);
        assert_close(command.left, 0.5);
        assert_close(command.right, 0.5);
    }

    #[test]
    fn test_mixer_slow_scales_both_wheels() {
        let mixer = DriveMixer::new(PowerLimits::default(), 0.5);
        let state = SteeringState { forward_back: -1.0, left_right: 0.25 };

        let command = mixer.command(&state, true);
        assert_close(command.left, 0.5);
        assert_close(command.right, 0.25);
    }

    #[test]
    fn test_mixer_stays_within_power_limit() {
        let mixer = DriveMixer::new(PowerLimits::from_voltages(14.4, 12.0), 0.5);
        let max = mixer.limits().max_power();
        for f in [-1.0, 0.0, 1.0] {
            for lr in [-1.0, 0.0, 1.0] {
                let state = SteeringState { forward_back: f, left_right: lr };
                let command = mixer.command(&state, false);
                assert!(command.left.abs() <= max + 1e-6);
                assert!(command.right.abs() <= max + 1e-6);
            }
        }
    }

    #[test]
    fn test_stop_command() {
        assert_eq!(MotorCommand::STOP, MotorCommand::default());
    }
}
