//! Recording policy domain

pub mod country_table;

pub use country_table::{CountryPolicyTable, PolicyRecord};
