//! Per-country recording permission table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::PolicyError;

/// One declarative entry: a comma-separated list of ISO codes and an
/// `allowed` value that must be exactly "true" or "false".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub iso: Option<String>,
    pub allowed: Option<String>,
}

impl PolicyRecord {
    pub fn new(iso: impl Into<String>, allowed: impl Into<String>) -> Self {
        Self {
            iso: Some(iso.into()),
            allowed: Some(allowed.into()),
        }
    }
}

/// Mapping from upper-case ISO country code to "recording legally permitted".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryPolicyTable {
    allowed_by_country: HashMap<String, bool>,
}

impl CountryPolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from declarative records.
    ///
    /// Any malformed record rejects the whole list: partial compliance data
    /// is never returned.
    pub fn from_records(records: &[PolicyRecord]) -> Result<Self, PolicyError> {
        let mut allowed_by_country = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let allowed = match record.allowed.as_deref() {
                Some("true") => true,
                Some("false") => false,
                Some(other) => {
                    return Err(PolicyError::MalformedEntry {
                        index,
                        reason: format!("allowed must be \"true\" or \"false\", got \"{}\"", other),
                    })
                }
                None => {
                    return Err(PolicyError::MalformedEntry {
                        index,
                        reason: "missing allowed value".to_string(),
                    })
                }
            };

            let iso = record.iso.as_deref().ok_or_else(|| PolicyError::MalformedEntry {
                index,
                reason: "missing iso code".to_string(),
            })?;

            for code in iso.split(',') {
                let code = code.trim();
                if code.is_empty() {
                    return Err(PolicyError::MalformedEntry {
                        index,
                        reason: format!("empty iso code in \"{}\"", iso),
                    });
                }
                allowed_by_country.insert(code.to_uppercase(), allowed);
            }
        }

        Ok(Self { allowed_by_country })
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_by_country.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed_by_country.len()
    }

    pub fn clear(&mut self) {
        self.allowed_by_country.clear();
    }

    /// Stored flag for a country, None if the country is not listed
    pub fn lookup(&self, iso: &str) -> Option<bool> {
        self.allowed_by_country
            .get(&iso.trim().to_uppercase())
            .copied()
    }

    /// True only when the country is listed and explicitly allowed
    pub fn allows(&self, iso: &str) -> bool {
        self.lookup(iso).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_comma_separated_codes() {
        let table = CountryPolicyTable::from_records(&[
            PolicyRecord::new("us,ca", "true"),
            PolicyRecord::new("DE", "false"),
        ])
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("US"), Some(true));
        assert_eq!(table.lookup("ca"), Some(true));
        assert_eq!(table.lookup("DE"), Some(false));
    }

    #[test]
    fn absent_country_is_denied() {
        let table =
            CountryPolicyTable::from_records(&[PolicyRecord::new("US", "true")]).unwrap();
        assert_eq!(table.lookup("FR"), None);
        assert!(!table.allows("FR"));
    }

    #[test]
    fn rejects_non_boolean_allowed() {
        let err = CountryPolicyTable::from_records(&[
            PolicyRecord::new("US", "true"),
            PolicyRecord::new("DE", "maybe"),
        ])
        .unwrap_err();

        assert!(matches!(err, PolicyError::MalformedEntry { index: 1, .. }));
    }

    #[test]
    fn rejects_capitalized_boolean() {
        assert!(CountryPolicyTable::from_records(&[PolicyRecord::new("US", "True")]).is_err());
    }

    #[test]
    fn rejects_missing_code() {
        let record = PolicyRecord {
            iso: None,
            allowed: Some("true".to_string()),
        };
        assert!(CountryPolicyTable::from_records(&[record]).is_err());
        assert!(CountryPolicyTable::from_records(&[PolicyRecord::new("US,,CA", "true")]).is_err());
    }

    #[test]
    fn later_entries_override_earlier() {
        let table = CountryPolicyTable::from_records(&[
            PolicyRecord::new("US", "true"),
            PolicyRecord::new("US", "false"),
        ])
        .unwrap();
        assert_eq!(table.lookup("US"), Some(false));
    }
}
