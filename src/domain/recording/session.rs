//! Recording session descriptor and queued start requests

use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::format::AudioFormat;

/// Placeholder used in artifact names when the subject number is unknown
pub const UNKNOWN_NUMBER: &str = "unknown";

/// Timestamp layout used in artifact names (yyMMdd_HHmmssSSS)
const ARTIFACT_TIMESTAMP_FORMAT: &str = "%y%m%d_%H%M%S%3f";

/// Opaque handle of an entry in the persistent catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogHandle(pub u64);

impl fmt::Display for CatalogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One capture attempt, from successful start until stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSession {
    /// Subject phone number, None when unknown
    pub phone_number: Option<String>,
    /// When the call started (epoch ms)
    pub creation_time: i64,
    /// Generated artifact file name
    pub artifact_name: String,
    /// Wall-clock time capture started (epoch ms)
    pub start_time: i64,
    /// Entry in the persistent catalog
    pub catalog_handle: CatalogHandle,
}

impl RecordingSession {
    /// Milliseconds elapsed since capture started
    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        u64::try_from(now_ms.saturating_sub(self.start_time)).unwrap_or(0)
    }

    /// Phone number safe for logs
    pub fn masked_number(&self) -> String {
        mask_number(self.phone_number.as_deref())
    }

    /// Whether this session records the given subject
    pub fn is_subject(&self, number: Option<&str>) -> bool {
        self.phone_number.as_deref() == number.and_then(non_empty)
    }
}

impl fmt::Display for RecordingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.artifact_name,
            self.masked_number(),
            self.catalog_handle
        )
    }
}

/// A start request queued while the engine connection is not yet established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub phone_number: String,
    pub creation_time: i64,
}

impl PendingRequest {
    pub fn new(phone_number: impl Into<String>, creation_time: i64) -> Self {
        Self {
            phone_number: phone_number.into(),
            creation_time,
        }
    }
}

/// Treat empty or blank numbers as unknown
pub fn normalize_number(number: &str) -> Option<String> {
    non_empty(number).map(str::to_string)
}

fn non_empty(number: &str) -> Option<&str> {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Mask a phone number for logs, keeping only the last 4 digits
pub fn mask_number(number: Option<&str>) -> String {
    match number {
        Some(n) if n.chars().count() > 4 => {
            let tail: String = n.chars().skip(n.chars().count() - 4).collect();
            format!("***{}", tail)
        }
        _ => "****".to_string(),
    }
}

/// Build the artifact name `<number|unknown>_<yyMMdd_HHmmssSSS>.<ext>`
pub fn artifact_name<Tz>(number: Option<&str>, at: &DateTime<Tz>, format: AudioFormat) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let subject: String = number
        .and_then(non_empty)
        .unwrap_or(UNKNOWN_NUMBER)
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    format!(
        "{}_{}.{}",
        subject,
        at.format(ARTIFACT_TIMESTAMP_FORMAT),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(number: Option<&str>) -> RecordingSession {
        RecordingSession {
            phone_number: number.map(str::to_string),
            creation_time: 1_000,
            artifact_name: "x.flac".to_string(),
            start_time: 10_000,
            catalog_handle: CatalogHandle(7),
        }
    }

    #[test]
    fn artifact_name_uses_number_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
            + chrono::Duration::milliseconds(42);
        let name = artifact_name(Some("+15551234"), &at, AudioFormat::Speech);
        assert_eq!(name, "+15551234_240309_140507042.flac");
    }

    #[test]
    fn artifact_name_uses_placeholder_for_unknown() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert!(artifact_name(None, &at, AudioFormat::Speech).starts_with("unknown_"));
        assert!(artifact_name(Some("  "), &at, AudioFormat::Speech).starts_with("unknown_"));
    }

    #[test]
    fn artifact_name_strips_path_separators() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = artifact_name(Some("12/34"), &at, AudioFormat::Speech);
        assert!(name.starts_with("12_34_"));
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask_number(Some("+15551234")), "***1234");
        assert_eq!(mask_number(Some("1234")), "****");
        assert_eq!(mask_number(None), "****");
    }

    #[test]
    fn normalize_treats_blank_as_unknown() {
        assert_eq!(normalize_number(""), None);
        assert_eq!(normalize_number(" +1555 "), Some("+1555".to_string()));
    }

    #[test]
    fn elapsed_never_negative() {
        let s = session(None);
        assert_eq!(s.elapsed_ms(12_500), 2_500);
        assert_eq!(s.elapsed_ms(5_000), 0);
    }

    #[test]
    fn subject_matching() {
        let s = session(Some("+1555"));
        assert!(s.is_subject(Some("+1555")));
        assert!(!s.is_subject(Some("+1666")));
        assert!(session(None).is_subject(Some("")));
        assert!(session(None).is_subject(None));
    }

    #[test]
    fn session_serializes_to_json() {
        let json = serde_json::to_string(&session(Some("+1555"))).unwrap();
        assert!(json.contains("\"catalog_handle\":7"));
        assert!(json.contains("\"phone_number\":\"+1555\""));
    }
}
