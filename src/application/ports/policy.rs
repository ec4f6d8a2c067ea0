//! Recording policy port interfaces

use crate::domain::error::PolicyError;
use crate::domain::policy::PolicyRecord;

/// Declarative source of per-country policy records
pub trait PolicySource: Send + Sync {
    fn records(&self) -> Result<Vec<PolicyRecord>, PolicyError>;
}

/// Geolocation collaborator
pub trait CountryLocator: Send + Sync {
    /// ISO 3166 alpha-2 code of the user's current country, if known
    fn current_country_iso(&self) -> Option<String>;
}
