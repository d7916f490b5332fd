//! # Steering State Module
//!
//! Folds gamepad events into the running [`SteeringState`].
//!
//! Axis values are last-known: the state only changes when an event for
//! the axis arrives and is never reset between loop iterations.
//!
//! Button bindings act on every event for the bound code, press or
//! release alike:
//!
//! | Binding | Effect |
//! |---------|--------|
//! | fast turn | halves the stored left/right value |
//! | slow | reported to the caller, scales this tick's output |
//! | EPO reset | reported to the caller, which resets the board latch |
//!
//! ## Usage
//!
//! ```
//! use pad_drive::config::GamepadConfig;
//! use pad_drive::drive::state::{InputAction, SteeringMapper};
//! use pad_drive::gamepad::event::InputEvent;
//!
//! let mut mapper = SteeringMapper::new(&GamepadConfig::default());
//!
//! let action = mapper.process_event(&InputEvent::new("ABS_Y", 0));
//! assert_eq!(action, Some(InputAction::ForwardBack));
//! assert_eq!(mapper.state().forward_back, -1.0);
//! ```

use super::axis::AxisMapping;
use super::mixer::FAST_TURN_FACTOR;
use crate::config::GamepadConfig;
use crate::gamepad::event::InputEvent;

/// Current drive demand, both values in -1.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringState {
    /// Forward/back demand
    pub forward_back: f32,
    /// Left/right demand, negative turns left
    pub left_right: f32,
}

/// What a recognized event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Vertical axis moved
    ForwardBack,
    /// Horizontal axis moved
    LeftRight,
    /// Fast-turn button event, steering halved
    FastTurn,
    /// Slow button event
    Slow,
    /// EPO reset button event
    ResetEpo,
}

/// Event codes the mapper listens for.
#[derive(Debug, Clone)]
struct Bindings {
    axis_up_down: String,
    axis_left_right: String,
    button_fast_turn: String,
    button_slow: String,
    button_reset_epo: String,
}

/// Parses gamepad events and maintains steering state.
///
/// Not thread-safe; owned by the control loop.
#[derive(Debug)]
pub struct SteeringMapper {
    bindings: Bindings,
    up_down: AxisMapping,
    left_right: AxisMapping,
    state: SteeringState,
}

impl SteeringMapper {
    /// Creates a mapper with centered state from the gamepad bindings.
    #[must_use]
    pub fn new(config: &GamepadConfig) -> Self {
        Self {
            bindings: Bindings {
                axis_up_down: config.axis_up_down.clone(),
                axis_left_right: config.axis_left_right.clone(),
                button_fast_turn: config.button_fast_turn.clone(),
                button_slow: config.button_slow.clone(),
                button_reset_epo: config.button_reset_epo.clone(),
            },
            up_down: AxisMapping::new(config.axis_up_down_inverted),
            left_right: AxisMapping::new(config.axis_left_right_inverted),
            state: SteeringState::default(),
        }
    }

    /// Returns the current steering state.
    #[must_use]
    pub fn state(&self) -> &SteeringState {
        &self.state
    }

    /// Processes one event, returning what it did or `None` if the code is
    /// not bound.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<InputAction> {
        let code = event.code.as_str();
        let bindings = &self.bindings;

        if code == bindings.axis_up_down {
            self.state.forward_back = self.up_down.apply(event.state);
            Some(InputAction::ForwardBack)
        } else if code == bindings.axis_left_right {
            self.state.left_right = self.left_right.apply(event.state);
            Some(InputAction::LeftRight)
        } else if code == bindings.button_fast_turn {
            self.state.left_right *= FAST_TURN_FACTOR;
            Some(InputAction::FastTurn)
        } else if code == bindings.button_slow {
            Some(InputAction::Slow)
        } else if code == bindings.button_reset_epo {
            Some(InputAction::ResetEpo)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> SteeringMapper {
        SteeringMapper::new(&GamepadConfig::default())
    }

    fn uninverted_mapper() -> SteeringMapper {
        let config = GamepadConfig {
            axis_up_down_inverted: false,
            axis_left_right_inverted: false,
            ..GamepadConfig::default()
        };
        SteeringMapper::new(&config)
    }

    #[test]
    fn test_initial_state_centered() {
        let mapper = mapper();
        assert_eq!(*mapper.state(), SteeringState::default());
        assert_eq!(mapper.state().forward_back, 0.0);
        assert_eq!(mapper.state().left_right, 0.0);
    }

    #[test]
    fn test_vertical_axis() {
        let mut mapper = uninverted_mapper();

        assert_eq!(
            mapper.process_event(&InputEvent::new("ABS_Y", 0)),
            Some(InputAction::ForwardBack)
        );
        assert_eq!(mapper.state().forward_back, 1.0);

        mapper.process_event(&InputEvent::new("ABS_Y", 255));
        assert_eq!(mapper.state().forward_back, -1.0);

        mapper.process_event(&InputEvent::new("ABS_Y", 128));
        assert_eq!(mapper.state().forward_back, 0.0);
    }

    #[test]
    fn test_inversion_flags_are_independent() {
        let config = GamepadConfig {
            axis_up_down_inverted: true,
            axis_left_right_inverted: false,
            ..GamepadConfig::default()
        };
        let mut mapper = SteeringMapper::new(&config);

        mapper.process_event(&InputEvent::new("ABS_Y", 0));
        mapper.process_event(&InputEvent::new("ABS_Z", 0));
        assert_eq!(mapper.state().forward_back, -1.0);
        assert_eq!(mapper.state().left_right, 1.0);
    }

    #[test]
    fn test_axes_keep_last_value() {
        let mut mapper = uninverted_mapper();

        mapper.process_event(&InputEvent::new("ABS_Y", 0));
        mapper.process_event(&InputEvent::new("ABS_Z", 255));
        mapper.process_event(&InputEvent::new("BTN_SOUTH", 1));

        assert_eq!(mapper.state().forward_back, 1.0);
        assert_eq!(mapper.state().left_right, -1.0);
    }

    #[test]
    fn test_fast_turn_halves_steering_per_event() {
        let mut mapper = uninverted_mapper();
        mapper.process_event(&InputEvent::new("ABS_Z", 0));

        assert_eq!(
            mapper.process_event(&InputEvent::new("BTN_TR", 1)),
            Some(InputAction::FastTurn)
        );
        assert_eq!(mapper.state().left_right, 0.5);

        // Release is an event too
        mapper.process_event(&InputEvent::new("BTN_TR", 0));
        assert_eq!(mapper.state().left_right, 0.25);
    }

    #[test]
    fn test_axis_event_after_fast_turn_overwrites() {
        let mut mapper = uninverted_mapper();
        mapper.process_event(&InputEvent::new("ABS_Z", 0));
        mapper.process_event(&InputEvent::new("BTN_TR", 1));
        mapper.process_event(&InputEvent::new("ABS_Z", 0));
        assert_eq!(mapper.state().left_right, 1.0);
    }

    #[test]
    fn test_buttons_do_not_touch_axes() {
        let mut mapper = uninverted_mapper();
        mapper.process_event(&InputEvent::new("ABS_Y", 0));

        assert_eq!(
            mapper.process_event(&InputEvent::new("BTN_TL", 1)),
            Some(InputAction::Slow)
        );
        assert_eq!(
            mapper.process_event(&InputEvent::new("BTN_TR2", 1)),
            Some(InputAction::ResetEpo)
        );
        assert_eq!(mapper.state().forward_back, 1.0);
        assert_eq!(mapper.state().left_right, 0.0);
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let mut mapper = mapper();
        mapper.process_event(&InputEvent::new("ABS_Y", 0));
        let before = *mapper.state();

        assert_eq!(mapper.process_event(&InputEvent::new("ABS_X", 0)), None);
        assert_eq!(mapper.process_event(&InputEvent::new("BTN_SOUTH", 1)), None);
        assert_eq!(mapper.process_event(&InputEvent::new("SYN_REPORT", 0)), None);
        assert_eq!(*mapper.state(), before);
    }

    #[test]
    fn test_custom_bindings() {
        let config = GamepadConfig {
            axis_up_down: "ABS_RY".to_string(),
            button_slow: "BTN_SOUTH".to_string(),
            ..GamepadConfig::default()
        };
        let mut mapper = SteeringMapper::new(&config);

        assert_eq!(mapper.process_event(&InputEvent::new("ABS_Y", 0)), None);
        assert_eq!(
            mapper.process_event(&InputEvent::new("ABS_RY", 0)),
            Some(InputAction::ForwardBack)
        );
        assert_eq!(
            mapper.process_event(&InputEvent::new("BTN_SOUTH", 1)),
            Some(InputAction::Slow)
        );
    }
}
