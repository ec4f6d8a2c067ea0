//! Output format tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidAudioFormatError;

/// Encoder settings derived from a format tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// Target bitrate in bits per second. Lossless encoders ignore it.
    pub bitrate: Option<u32>,
}

/// Output format preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioFormat {
    /// Compact speech encoding: 16 kHz mono
    #[default]
    Speech,
    /// General-purpose encoding with explicit bitrate and 44.1 kHz sample rate
    HighQuality,
}

impl AudioFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::HighQuality => "high-quality",
        }
    }

    pub const fn settings(&self) -> EncoderSettings {
        match self {
            Self::Speech => EncoderSettings {
                sample_rate: 16_000,
                channels: 1,
                bitrate: None,
            },
            Self::HighQuality => EncoderSettings {
                sample_rate: 44_100,
                channels: 1,
                bitrate: Some(128_000),
            },
        }
    }

    /// File extension for artifacts in this format
    pub const fn extension(&self) -> &'static str {
        "flac"
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = InvalidAudioFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speech" | "0" => Ok(Self::Speech),
            "high-quality" | "high_quality" | "hq" | "1" => Ok(Self::HighQuality),
            _ => Err(InvalidAudioFormatError {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_is_16k_without_bitrate() {
        let settings = AudioFormat::Speech.settings();
        assert_eq!(settings.sample_rate, 16_000);
        assert!(settings.bitrate.is_none());
    }

    #[test]
    fn high_quality_sets_bitrate_and_rate() {
        let settings = AudioFormat::HighQuality.settings();
        assert_eq!(settings.sample_rate, 44_100);
        assert_eq!(settings.bitrate, Some(128_000));
    }

    #[test]
    fn parses_legacy_numeric_choice() {
        assert_eq!("0".parse::<AudioFormat>().unwrap(), AudioFormat::Speech);
        assert_eq!("1".parse::<AudioFormat>().unwrap(), AudioFormat::HighQuality);
        assert!("mp3".parse::<AudioFormat>().is_err());
    }
}
