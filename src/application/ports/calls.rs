//! Call-tracking port interfaces

/// Host call-tracking event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// A call was added, removed, held or resumed
    CallListChanged,
    /// A call ended
    CallDisconnected { number: Option<String> },
}

/// Query side of the host call list
pub trait CallTracker: Send + Sync {
    fn active_call_exists(&self) -> bool;

    fn call_on_hold(&self, number: Option<&str>) -> bool;
}
