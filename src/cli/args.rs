//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::recording::{AudioFormat, CapabilityTier};

/// Call Recorder - records phone calls from the best available audio source
#[derive(Parser, Debug)]
#[command(name = "call-recorder")]
#[command(version)]
#[command(about = "Call recording engine daemon and connection supervisor")]
#[command(long_about = None)]
pub struct Cli {
    /// Engine socket path
    #[arg(long, global = true, value_name = "PATH", env = "CALL_RECORDER_SOCKET")]
    pub socket: Option<String>,

    /// ISO country code used for the recording policy check
    #[arg(long, global = true, value_name = "ISO", env = "CALL_RECORDER_COUNTRY")]
    pub country: Option<String>,

    /// Output encoder tier
    #[arg(short = 'f', long, global = true, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Capability tier selecting the default source chain
    #[arg(short = 't', long, global = true, value_name = "TIER")]
    pub tier: Option<TierArg>,

    /// Show desktop notifications
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the recording engine daemon
    Engine,
    /// Run the connection supervisor, reading call events from stdin
    Supervise,
    /// Send one request to a running engine
    Ctl {
        #[command(subcommand)]
        action: CtlAction,
    },
    /// Check whether recording is permitted in a country
    Policy {
        /// Policy table to use instead of the built-in one
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Engine control actions
#[derive(Subcommand, Debug, Clone)]
pub enum CtlAction {
    /// Start recording a call
    Start {
        /// Subject phone number
        phone_number: String,
    },
    /// Stop the active recording
    Stop,
    /// Show whether the engine is recording
    Status,
    /// Show the active recording session
    Active,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Speech,
    HighQuality,
}

impl From<FormatArg> for AudioFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Speech => AudioFormat::Speech,
            FormatArg::HighQuality => AudioFormat::HighQuality,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Privileged,
    Standard,
}

impl From<TierArg> for CapabilityTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Privileged => CapabilityTier::Privileged,
            TierArg::Standard => CapabilityTier::Standard,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "audio_format",
    "capability_tier",
    "audio_sources",
    "retry_base_delay",
    "max_retries",
    "connect_timeout",
    "progress_interval",
    "recordings_dir",
    "country",
    "socket_path",
    "notify",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_engine() {
        let cli = Cli::parse_from(["call-recorder", "engine"]);
        assert!(matches!(cli.command, Commands::Engine));
        assert!(cli.format.is_none());
        assert!(!cli.notify);
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "call-recorder",
            "supervise",
            "--country",
            "US",
            "-f",
            "high-quality",
            "-t",
            "standard",
            "-n",
        ]);
        assert!(matches!(cli.command, Commands::Supervise));
        assert_eq!(cli.country.as_deref(), Some("US"));
        assert_eq!(cli.format, Some(FormatArg::HighQuality));
        assert_eq!(cli.tier, Some(TierArg::Standard));
        assert!(cli.notify);
    }

    #[test]
    fn cli_parses_ctl_start() {
        let cli = Cli::parse_from(["call-recorder", "ctl", "start", "+15551234"]);
        match cli.command {
            Commands::Ctl {
                action: CtlAction::Start { phone_number },
            } => assert_eq!(phone_number, "+15551234"),
            other => panic!("Expected ctl start, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_policy_file() {
        let cli = Cli::parse_from(["call-recorder", "policy", "--file", "/tmp/p.toml"]);
        match cli.command {
            Commands::Policy { file } => assert_eq!(file, Some(PathBuf::from("/tmp/p.toml"))),
            other => panic!("Expected policy, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["call-recorder", "config", "set", "max_retries", "5"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "max_retries");
            assert_eq!(value, "5");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn arg_enums_convert_to_domain() {
        assert_eq!(AudioFormat::from(FormatArg::Speech), AudioFormat::Speech);
        assert_eq!(CapabilityTier::from(TierArg::Privileged), CapabilityTier::Privileged);
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("audio_sources"));
        assert!(is_valid_config_key("max_retries"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
