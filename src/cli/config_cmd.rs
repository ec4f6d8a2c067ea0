//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{AudioFormat, AudioSource, CapabilityTier, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    store
        .update(&|config: &mut AppConfig| apply_value(config, key, value))
        .await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "audio_format" => {
            let format: AudioFormat = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.audio_format = Some(format.to_string());
        }
        "capability_tier" => {
            let tier: CapabilityTier = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.capability_tier = Some(tier.to_string());
        }
        "audio_sources" => {
            let sources = parse_sources(value).map_err(invalid)?;
            config.audio_sources = Some(sources.iter().map(|s| s.to_string()).collect());
        }
        "retry_base_delay" | "connect_timeout" | "progress_interval" => {
            let duration: Duration = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            if duration.as_millis() == 0 {
                return Err(invalid("Duration must be greater than zero".to_string()));
            }
            let text = Some(duration.to_string());
            match key {
                "retry_base_delay" => config.retry_base_delay = text,
                "connect_timeout" => config.connect_timeout = text,
                _ => config.progress_interval = text,
            }
        }
        "max_retries" => {
            let retries: u32 = value
                .trim()
                .parse()
                .map_err(|_| invalid("Value must be a non-negative integer".to_string()))?;
            config.max_retries = Some(retries);
        }
        "recordings_dir" => config.recordings_dir = Some(value.to_string()),
        "country" => {
            let iso = value.trim();
            if iso.len() != 2 || !iso.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(invalid("Value must be a two-letter ISO country code".to_string()));
            }
            config.country = Some(iso.to_uppercase());
        }
        "socket_path" => config.socket_path = Some(value.to_string()),
        "notify" => {
            let notify = parse_bool(value)
                .map_err(|_| invalid("Value must be 'true' or 'false'".to_string()))?;
            config.notify = Some(notify);
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "audio_format" => config.audio_format.clone(),
        "capability_tier" => config.capability_tier.clone(),
        "audio_sources" => config.audio_sources.as_ref().map(|s| s.join(",")),
        "retry_base_delay" => config.retry_base_delay.clone(),
        "max_retries" => config.max_retries.map(|n| n.to_string()),
        "connect_timeout" => config.connect_timeout.clone(),
        "progress_interval" => config.progress_interval.clone(),
        "recordings_dir" => config.recordings_dir.clone(),
        "country" => config.country.clone(),
        "socket_path" => config.socket_path.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        _ => None,
    }
}

/// Parse a comma-separated source list, e.g. "voice-call,mic"
fn parse_sources(value: &str) -> Result<Vec<AudioSource>, String> {
    let sources = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AudioSource>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    if sources.is_empty() {
        return Err("At least one audio source is required".to_string());
    }
    Ok(sources)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
