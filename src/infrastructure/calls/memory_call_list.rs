//! In-memory call list fed by call-tracking events

use std::sync::{Mutex, MutexGuard};

use crate::application::ports::CallTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Active,
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCall {
    pub number: String,
    pub status: CallStatus,
}

/// Host call list kept in memory
#[derive(Debug, Default)]
pub struct MemoryCallList {
    calls: Mutex<Vec<TrackedCall>>,
}

impl MemoryCallList {
    pub fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> MutexGuard<'_, Vec<TrackedCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_status(&self, number: &str, status: CallStatus) -> bool {
        match self.calls().iter_mut().find(|c| c.number == number) {
            Some(call) => {
                call.status = status;
                true
            }
            None => false,
        }
    }

    /// Add a call or make an existing one active
    pub fn activate(&self, number: &str) {
        if !self.set_status(number, CallStatus::Active) {
            self.calls().push(TrackedCall {
                number: number.to_string(),
                status: CallStatus::Active,
            });
        }
    }

    /// Returns false for unknown numbers
    pub fn hold(&self, number: &str) -> bool {
        self.set_status(number, CallStatus::OnHold)
    }

    /// Returns false for unknown numbers
    pub fn resume(&self, number: &str) -> bool {
        self.set_status(number, CallStatus::Active)
    }

    /// Returns false for unknown numbers
    pub fn remove(&self, number: &str) -> bool {
        let mut calls = self.calls();
        let before = calls.len();
        calls.retain(|c| c.number != number);
        calls.len() != before
    }

    pub fn snapshot(&self) -> Vec<TrackedCall> {
        self.calls().clone()
    }
}

impl CallTracker for MemoryCallList {
    fn active_call_exists(&self) -> bool {
        self.calls().iter().any(|c| c.status == CallStatus::Active)
    }

    fn call_on_hold(&self, number: Option<&str>) -> bool {
        let Some(number) = number else {
            return false;
        };
        self.calls()
            .iter()
            .any(|c| c.status == CallStatus::OnHold && c.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_active_and_held_calls() {
        let calls = MemoryCallList::new();
        assert!(!calls.active_call_exists());

        calls.activate("+15551234");
        assert!(calls.active_call_exists());

        assert!(calls.hold("+15551234"));
        assert!(!calls.active_call_exists());
        assert!(calls.call_on_hold(Some("+15551234")));
        assert!(!calls.call_on_hold(None));

        assert!(calls.resume("+15551234"));
        assert!(!calls.call_on_hold(Some("+15551234")));
    }

    #[test]
    fn activate_is_idempotent() {
        let calls = MemoryCallList::new();
        calls.activate("+1");
        calls.activate("+1");
        assert_eq!(calls.snapshot().len(), 1);
    }

    #[test]
    fn unknown_numbers_are_reported() {
        let calls = MemoryCallList::new();
        assert!(!calls.hold("+1"));
        assert!(!calls.remove("+1"));
        calls.activate("+1");
        assert!(calls.remove("+1"));
        assert!(calls.snapshot().is_empty());
    }
}
