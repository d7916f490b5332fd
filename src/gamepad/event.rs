//! # Input Events
//!
//! Symbolic gamepad events and the [`InputSource`] trait the control loop
//! reads them from.
//!
//! Codes use the Linux input constant names (`ABS_Y`, `BTN_TL`, ...), which
//! is also how bindings are written in the configuration.

use async_trait::async_trait;
use evdev::InputEventKind;

use crate::error::Result;

/// One gamepad event: a symbolic code and its integer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// Symbolic code, e.g. `ABS_Y` or `BTN_TL`
    pub code: String,
    /// Axis position or button state (1 pressed, 0 released)
    pub state: i32,
}

impl InputEvent {
    /// Event with the given code and state.
    pub fn new(code: impl Into<String>, state: i32) -> Self {
        Self {
            code: code.into(),
            state,
        }
    }
}

/// Source of input event batches.
#[async_trait]
pub trait InputSource: Send {
    /// Waits for the next batch of events.
    ///
    /// A batch holds everything the device reported up to one sync marker
    /// and is never empty.
    async fn poll(&mut self) -> Result<Vec<InputEvent>>;
}

/// Converts a raw evdev event into a symbolic one.
///
/// Returns `None` for sync markers and event types that carry no axis or
/// button (LEDs, force feedback, misc).
#[must_use]
pub fn from_evdev(event: &evdev::InputEvent) -> Option<InputEvent> {
    let code = match event.kind() {
        InputEventKind::AbsAxis(axis) => format!("{:?}", axis),
        InputEventKind::Key(key) => format!("{:?}", key),
        _ => return None,
    };

    Some(InputEvent::new(code, event.value()))
}

/// Returns whether the event closes a batch.
#[must_use]
pub fn is_sync_report(event: &evdev::InputEvent) -> bool {
    matches!(
        event.kind(),
        InputEventKind::Synchronization(evdev::Synchronization::SYN_REPORT)
    )
}

/// Collects events until a sync report closes the batch.
///
/// Events collected so far stay here across calls, so a poll that is
/// cancelled mid-batch resumes where it stopped.
#[derive(Debug, Default)]
pub struct EventBatcher {
    pending: Vec<InputEvent>,
}

impl EventBatcher {
    /// Adds one raw event, returning the batch it completes.
    ///
    /// Sync reports with nothing collected yield no batch.
    pub fn push(&mut self, event: &evdev::InputEvent) -> Option<Vec<InputEvent>> {
        if is_sync_report(event) {
            if self.pending.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.pending));
        }

        if let Some(event) = from_evdev(event) {
            self.pending.push(event);
        }
        None
    }

    /// Number of events waiting for a sync report.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted batches, then waits forever.
    #[derive(Clone, Default)]
    pub struct ScriptedSource {
        pub batches: Arc<Mutex<VecDeque<Result<Vec<InputEvent>>>>>,
        pub polls: Arc<Mutex<usize>>,
    }

    impl ScriptedSource {
        pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
            let source = Self::default();
            for batch in batches {
                source.push(Ok(batch));
            }
            source
        }

        pub fn push(&self, batch: Result<Vec<InputEvent>>) {
            self.batches.lock().unwrap().push_back(batch);
        }

        pub fn poll_count(&self) -> usize {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl InputSource for ScriptedSource {
        async fn poll(&mut self) -> Result<Vec<InputEvent>> {
            *self.polls.lock().unwrap() += 1;
            let next = self.batches.lock().unwrap().pop_front();
            match next {
                Some(batch) => batch,
                None => std::future::pending().await,
            }
        }
    }
}
