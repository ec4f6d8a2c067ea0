//! Engine connection domain

pub mod state;

pub use state::{ConnectionMachine, ConnectionState, RetryDecision, RetryPolicy, DEFAULT_MAX_RETRIES};
