//! Capture sources and the ordered fallback chain

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{InvalidAudioSourceError, InvalidCapabilityTierError};

/// Logical origin for audio samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioSource {
    /// Full-duplex call audio (both sides of the call)
    VoiceCall,
    /// Microphone tuned for VoIP (echo cancellation, AGC)
    VoiceCommunication,
    /// Microphone tuned for speech recognition
    VoiceRecognition,
    /// Plain microphone, the last resort
    Mic,
}

impl AudioSource {
    pub const ALL: [AudioSource; 4] = [
        Self::VoiceCall,
        Self::VoiceCommunication,
        Self::VoiceRecognition,
        Self::Mic,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VoiceCall => "voice-call",
            Self::VoiceCommunication => "voice-communication",
            Self::VoiceRecognition => "voice-recognition",
            Self::Mic => "mic",
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioSource {
    type Err = InvalidAudioSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| InvalidAudioSourceError {
                input: s.to_string(),
            })
    }
}

/// Platform capability tier, selects the default candidate order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTier {
    /// Call audio can be captured directly
    Privileged,
    /// Only microphone-class sources are reachable
    #[default]
    Standard,
}

impl CapabilityTier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Privileged => "privileged",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityTier {
    type Err = InvalidCapabilityTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "privileged" => Ok(Self::Privileged),
            "standard" => Ok(Self::Standard),
            _ => Err(InvalidCapabilityTierError {
                input: s.to_string(),
            }),
        }
    }
}

/// Ordered, fixed sequence of capture sources tried until one starts.
///
/// Never empty and never contains the same source twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSourceChain {
    candidates: Vec<AudioSource>,
}

impl AudioSourceChain {
    /// Default chain for a capability tier
    pub fn for_tier(tier: CapabilityTier) -> Self {
        let candidates = match tier {
            CapabilityTier::Privileged => vec![
                AudioSource::VoiceCall,
                AudioSource::VoiceRecognition,
                AudioSource::Mic,
            ],
            CapabilityTier::Standard => vec![
                AudioSource::VoiceRecognition,
                AudioSource::VoiceCommunication,
                AudioSource::Mic,
            ],
        };
        Self { candidates }
    }

    /// Build a chain from an explicit order. Duplicates keep their first position.
    /// Returns None if no sources are given.
    pub fn from_sources(sources: impl IntoIterator<Item = AudioSource>) -> Option<Self> {
        let mut candidates: Vec<AudioSource> = Vec::new();
        for source in sources {
            if !candidates.contains(&source) {
                candidates.push(source);
            }
        }
        if candidates.is_empty() {
            None
        } else {
            Some(Self { candidates })
        }
    }

    /// Candidates in priority order
    pub fn candidates(&self) -> &[AudioSource] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The strongest candidate
    pub fn primary(&self) -> AudioSource {
        self.candidates[0]
    }
}

impl Default for AudioSourceChain {
    fn default() -> Self {
        Self::for_tier(CapabilityTier::default())
    }
}

impl fmt::Display for AudioSourceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.candidates.iter().map(|s| s.as_str()).collect();
        write!(f, "{}", names.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_tier_starts_with_call_audio() {
        let chain = AudioSourceChain::for_tier(CapabilityTier::Privileged);
        assert_eq!(chain.primary(), AudioSource::VoiceCall);
        assert_eq!(chain.candidates().last(), Some(&AudioSource::Mic));
    }

    #[test]
    fn standard_tier_is_microphone_only() {
        let chain = AudioSourceChain::for_tier(CapabilityTier::Standard);
        assert!(!chain.candidates().contains(&AudioSource::VoiceCall));
        assert_eq!(chain.candidates().last(), Some(&AudioSource::Mic));
    }

    #[test]
    fn explicit_order_drops_duplicates() {
        let chain = AudioSourceChain::from_sources([
            AudioSource::Mic,
            AudioSource::VoiceCall,
            AudioSource::Mic,
        ])
        .unwrap();
        assert_eq!(
            chain.candidates(),
            &[AudioSource::Mic, AudioSource::VoiceCall]
        );
    }

    #[test]
    fn explicit_order_rejects_empty() {
        assert!(AudioSourceChain::from_sources([]).is_none());
    }

    #[test]
    fn source_parses_names() {
        assert_eq!("voice-call".parse::<AudioSource>().unwrap(), AudioSource::VoiceCall);
        assert_eq!(
            "VOICE_RECOGNITION".parse::<AudioSource>().unwrap(),
            AudioSource::VoiceRecognition
        );
        assert!("speaker".parse::<AudioSource>().is_err());
    }

    #[test]
    fn tier_parses_names() {
        assert_eq!(
            "privileged".parse::<CapabilityTier>().unwrap(),
            CapabilityTier::Privileged
        );
        assert!("root".parse::<CapabilityTier>().is_err());
    }

    #[test]
    fn chain_display() {
        let chain = AudioSourceChain::for_tier(CapabilityTier::Privileged);
        assert_eq!(chain.to_string(), "voice-call -> voice-recognition -> mic");
    }
}
