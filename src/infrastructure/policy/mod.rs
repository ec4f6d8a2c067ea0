//! Recording policy adapters

mod locale;
mod toml_source;

pub use locale::{country_from_locale, LocaleCountryLocator};
pub use toml_source::TomlPolicySource;
