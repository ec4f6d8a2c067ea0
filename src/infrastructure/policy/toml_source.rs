//! Country policy records from TOML

use std::path::PathBuf;

use serde::Deserialize;

use crate::application::ports::PolicySource;
use crate::domain::error::PolicyError;
use crate::domain::policy::PolicyRecord;

/// Policy table shipped with the binary
const EMBEDDED_POLICY: &str = include_str!("../../../resources/call_record_states.toml");

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    country: Vec<PolicyRecord>,
}

enum Origin {
    Embedded,
    File(PathBuf),
}

/// Reads `[[country]]` records with `iso` and `allowed` keys
pub struct TomlPolicySource {
    origin: Origin,
}

impl TomlPolicySource {
    /// The table compiled into the binary
    pub fn embedded() -> Self {
        Self {
            origin: Origin::Embedded,
        }
    }

    /// A table read from disk on every load
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
        }
    }

    fn parse(content: &str) -> Result<Vec<PolicyRecord>, PolicyError> {
        let document: PolicyDocument =
            toml::from_str(content).map_err(|e| PolicyError::ParseError(e.to_string()))?;
        Ok(document.country)
    }
}

impl Default for TomlPolicySource {
    fn default() -> Self {
        Self::embedded()
    }
}

impl PolicySource for TomlPolicySource {
    fn records(&self) -> Result<Vec<PolicyRecord>, PolicyError> {
        match &self.origin {
            Origin::Embedded => Self::parse(EMBEDDED_POLICY),
            Origin::File(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| PolicyError::ReadError(format!("{}: {}", path.display(), e)))?;
                Self::parse(&content)
            }
        }
    }
}
