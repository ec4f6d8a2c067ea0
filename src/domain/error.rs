//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unknown audio source name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid audio source: \"{input}\". Valid sources are: voice-call, voice-communication, voice-recognition, mic")]
pub struct InvalidAudioSourceError {
    pub input: String,
}

/// Error when an unknown audio format name is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid audio format: \"{input}\". Valid formats are: speech, high-quality")]
pub struct InvalidAudioFormatError {
    pub input: String,
}

/// Error when an unknown capability tier is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid capability tier: \"{input}\". Valid tiers are: privileged, standard")]
pub struct InvalidCapabilityTierError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when the country policy resource cannot be loaded.
/// Any of these leaves the policy table empty (deny-all).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Failed to read policy resource: {0}")]
    ReadError(String),

    #[error("Failed to parse policy resource: {0}")]
    ParseError(String),

    #[error("Unexpected country specification at entry {index}: {reason}")]
    MalformedEntry { index: usize, reason: String },
}
