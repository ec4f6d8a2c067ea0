//! Engine connection state machine and reconnect backoff

use std::fmt;
use std::time::Duration as StdDuration;

use crate::domain::recording::Duration;

/// Maximum automatic reconnect attempts before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Logical connection to the engine process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exponential backoff: delay(r) = base * 2^(r-1) for r in 1..=max_retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based), None when out of range
    pub fn delay_for(&self, retry: u32) -> Option<StdDuration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 1u64.checked_shl(retry - 1)?;
        let millis = self.base_delay.as_millis().checked_mul(factor)?;
        Some(StdDuration::from_millis(millis))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::default_retry_base_delay(), DEFAULT_MAX_RETRIES)
    }
}

/// What to do after a failed or lost connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is the 1-based retry number
    Retry { attempt: u32, delay: StdDuration },
    /// Retries exhausted, stay disconnected until re-initialized
    Exhausted,
}

/// Tracks connection state and the bounded retry counter.
///
/// Transitions:
///   DISCONNECTED -> CONNECTING (begin_connect)
///   CONNECTING -> CONNECTED (connected)
///   CONNECTING -> DISCONNECTED (connect_failed, counts a retry)
///   CONNECTED -> DISCONNECTED (lost, counts a retry)
///   any -> DISCONNECTED (teardown)
#[derive(Debug, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
    retry_count: u32,
    exhausted: bool,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// True once retries ran out; cleared by `reset`
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fresh start for an explicit initialize
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.retry_count = 0;
        self.exhausted = false;
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Bind succeeded; the retry budget is restored
    pub fn connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.retry_count = 0;
        self.exhausted = false;
    }

    /// Bind failed or timed out
    pub fn connect_failed(&mut self, policy: &RetryPolicy) -> RetryDecision {
        self.state = ConnectionState::Disconnected;
        self.next_retry(policy)
    }

    /// Remote process went away while connected
    pub fn lost(&mut self, policy: &RetryPolicy) -> RetryDecision {
        self.state = ConnectionState::Disconnected;
        self.next_retry(policy)
    }

    pub fn teardown(&mut self) {
        self.reset();
    }

    fn next_retry(&mut self, policy: &RetryPolicy) -> RetryDecision {
        if self.retry_count < policy.max_retries() {
            self.retry_count += 1;
            if let Some(delay) = policy.delay_for(self.retry_count) {
                return RetryDecision::Retry {
                    attempt: self.retry_count,
                    delay,
                };
            }
        }
        self.exhausted = true;
        RetryDecision::Exhausted
    }
}
