//! Capture resource state machine

use std::fmt;
use thiserror::Error;

/// States of the single capture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Preparing,
    Recording,
}

impl CaptureState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: CaptureState,
    pub action: String,
}

/// Lifecycle of the capture resource.
///
/// State machine:
///   IDLE -> PREPARING (begin_prepare)
///   PREPARING -> RECORDING (mark_recording)
///   PREPARING -> IDLE (abort_prepare)
///   RECORDING -> IDLE (finish)
///
/// Stopping is synchronous, so there is no observable stopping state.
#[derive(Debug, Default)]
pub struct CaptureLifecycle {
    state: CaptureState,
}

impl CaptureLifecycle {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == CaptureState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    fn transition(
        &mut self,
        from: CaptureState,
        to: CaptureState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Transition from IDLE to PREPARING
    pub fn begin_prepare(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(CaptureState::Idle, CaptureState::Preparing, "prepare capture")
    }

    /// Transition from PREPARING to RECORDING
    pub fn mark_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            CaptureState::Preparing,
            CaptureState::Recording,
            "start recording",
        )
    }

    /// Transition from PREPARING back to IDLE after a failed start
    pub fn abort_prepare(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(CaptureState::Preparing, CaptureState::Idle, "abort prepare")
    }

    /// Transition from RECORDING to IDLE
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(CaptureState::Recording, CaptureState::Idle, "stop recording")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_idle() {
        let lifecycle = CaptureLifecycle::new();
        assert!(lifecycle.is_idle());
        assert!(!lifecycle.is_recording());
    }

    #[test]
    fn full_cycle() {
        let mut lifecycle = CaptureLifecycle::new();
        lifecycle.begin_prepare().unwrap();
        assert_eq!(lifecycle.state(), CaptureState::Preparing);

        lifecycle.mark_recording().unwrap();
        assert!(lifecycle.is_recording());

        lifecycle.finish().unwrap();
        assert!(lifecycle.is_idle());

        // Can start another cycle
        lifecycle.begin_prepare().unwrap();
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut lifecycle = CaptureLifecycle::new();
        lifecycle.begin_prepare().unwrap();
        lifecycle.abort_prepare().unwrap();
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn prepare_while_recording_fails() {
        let mut lifecycle = CaptureLifecycle::new();
        lifecycle.begin_prepare().unwrap();
        lifecycle.mark_recording().unwrap();

        let err = lifecycle.begin_prepare().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Recording);
        assert!(err.action.contains("prepare"));
    }

    #[test]
    fn finish_from_idle_fails() {
        let mut lifecycle = CaptureLifecycle::new();
        let err = lifecycle.finish().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Idle);
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: CaptureState::Preparing,
            action: "stop recording".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("stop recording"));
        assert!(msg.contains("preparing"));
    }
}
