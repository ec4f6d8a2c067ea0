//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::connection::{RetryPolicy, DEFAULT_MAX_RETRIES};
use crate::domain::recording::{AudioFormat, AudioSource, AudioSourceChain, CapabilityTier, Duration};

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub audio_format: Option<String>,
    pub capability_tier: Option<String>,
    pub audio_sources: Option<Vec<String>>,
    pub retry_base_delay: Option<String>,
    pub max_retries: Option<u32>,
    pub connect_timeout: Option<String>,
    pub progress_interval: Option<String>,
    pub recordings_dir: Option<String>,
    pub country: Option<String>,
    pub socket_path: Option<String>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            audio_format: Some(AudioFormat::default().to_string()),
            capability_tier: Some(CapabilityTier::default().to_string()),
            audio_sources: None,
            retry_base_delay: Some(Duration::default_retry_base_delay().to_string()),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            connect_timeout: Some(Duration::default_connect_timeout().to_string()),
            progress_interval: Some(Duration::default_progress_interval().to_string()),
            recordings_dir: None,
            country: None,
            socket_path: None,
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            audio_format: other.audio_format.or(self.audio_format),
            capability_tier: other.capability_tier.or(self.capability_tier),
            audio_sources: other.audio_sources.or(self.audio_sources),
            retry_base_delay: other.retry_base_delay.or(self.retry_base_delay),
            max_retries: other.max_retries.or(self.max_retries),
            connect_timeout: other.connect_timeout.or(self.connect_timeout),
            progress_interval: other.progress_interval.or(self.progress_interval),
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            country: other.country.or(self.country),
            socket_path: other.socket_path.or(self.socket_path),
            notify: other.notify.or(self.notify),
        }
    }

    /// Get audio format, or speech if not set/invalid
    pub fn audio_format_or_default(&self) -> AudioFormat {
        self.audio_format
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get capability tier, or standard if not set/invalid
    pub fn capability_tier_or_default(&self) -> CapabilityTier {
        self.capability_tier
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Explicit `audio_sources` order if it names at least one valid source,
    /// otherwise the default chain of the capability tier
    pub fn source_chain(&self) -> AudioSourceChain {
        self.audio_sources
            .as_ref()
            .and_then(|names| {
                AudioSourceChain::from_sources(
                    names.iter().filter_map(|n| n.parse::<AudioSource>().ok()),
                )
            })
            .unwrap_or_else(|| AudioSourceChain::for_tier(self.capability_tier_or_default()))
    }

    /// Reconnect backoff built from `retry_base_delay` and `max_retries`
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = self
            .retry_base_delay
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_retry_base_delay);
        RetryPolicy::new(base, self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
    }

    pub fn connect_timeout_or_default(&self) -> Duration {
        self.connect_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_connect_timeout)
    }

    pub fn progress_interval_or_default(&self) -> Duration {
        self.progress_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_progress_interval)
    }

    /// Directory holding finished recordings and the catalog manifest
    pub fn recordings_dir_or_default(&self) -> PathBuf {
        match self.recordings_dir.as_ref() {
            Some(dir) => PathBuf::from(dir),
            None => dirs::audio_dir()
                .or_else(dirs::data_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("CallRecordings"),
        }
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.audio_format, Some("speech".to_string()));
        assert_eq!(config.capability_tier, Some("standard".to_string()));
        assert_eq!(config.retry_base_delay, Some("2s".to_string()));
        assert_eq!(config.max_retries, Some(3));
        assert_eq!(config.progress_interval, Some("500ms".to_string()));
        assert_eq!(config.notify, Some(false));
        assert!(config.country.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.audio_format.is_none());
        assert!(config.max_retries.is_none());
        assert!(config.socket_path.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            audio_format: Some("speech".to_string()),
            country: Some("US".to_string()),
            max_retries: Some(3),
            ..Default::default()
        };

        let other = AppConfig {
            audio_format: Some("high-quality".to_string()),
            country: None, // Should not override
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.audio_format, Some("high-quality".to_string()));
        assert_eq!(merged.country, Some("US".to_string()));
        assert_eq!(merged.max_retries, Some(3));
    }

    #[test]
    fn source_chain_prefers_explicit_order() {
        let config = AppConfig {
            capability_tier: Some("privileged".to_string()),
            audio_sources: Some(vec!["mic".to_string(), "bogus".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.source_chain().candidates(), &[AudioSource::Mic]);
    }

    #[test]
    fn source_chain_falls_back_to_tier() {
        let config = AppConfig {
            capability_tier: Some("privileged".to_string()),
            audio_sources: Some(vec!["bogus".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.source_chain().primary(), AudioSource::VoiceCall);
    }

    #[test]
    fn retry_policy_from_config() {
        let config = AppConfig {
            retry_base_delay: Some("250ms".to_string()),
            max_retries: Some(5),
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 5);
        assert_eq!(policy.delay_for(3), Some(StdDuration::from_millis(1000)));
    }

    #[test]
    fn invalid_values_use_defaults() {
        let config = AppConfig {
            audio_format: Some("mp3".to_string()),
            connect_timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.audio_format_or_default(), AudioFormat::Speech);
        assert_eq!(config.connect_timeout_or_default().as_secs(), 5);
    }

    #[test]
    fn recordings_dir_override() {
        let config = AppConfig {
            recordings_dir: Some("/tmp/calls".to_string()),
            ..Default::default()
        };
        assert_eq!(config.recordings_dir_or_default(), PathBuf::from("/tmp/calls"));
    }
}
