//! Geolocation from configuration or the process locale

use tracing::debug;

use crate::application::ports::CountryLocator;

/// Locale variables consulted in order
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Country from an explicit override, otherwise from the locale
#[derive(Debug, Clone, Default)]
pub struct LocaleCountryLocator {
    override_iso: Option<String>,
}

impl LocaleCountryLocator {
    pub fn new(override_iso: Option<String>) -> Self {
        Self {
            override_iso: override_iso
                .map(|iso| iso.trim().to_uppercase())
                .filter(|iso| !iso.is_empty()),
        }
    }
}

impl CountryLocator for LocaleCountryLocator {
    fn current_country_iso(&self) -> Option<String> {
        if let Some(iso) = &self.override_iso {
            return Some(iso.clone());
        }

        let iso = LOCALE_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|locale| country_from_locale(&locale));
        debug!("Country from locale: {:?}", iso);
        iso
    }
}

/// Extract the territory of a POSIX locale such as `en_US.UTF-8`
pub fn country_from_locale(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?;
    let (_, territory) = base.split_once('_')?;
    if territory.len() == 2 && territory.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(territory.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_locales() {
        assert_eq!(country_from_locale("en_US.UTF-8"), Some("US".to_string()));
        assert_eq!(country_from_locale("de_DE@euro"), Some("DE".to_string()));
        assert_eq!(country_from_locale("pt_br"), Some("BR".to_string()));
    }

    #[test]
    fn rejects_locales_without_territory() {
        assert_eq!(country_from_locale("C"), None);
        assert_eq!(country_from_locale("POSIX"), None);
        assert_eq!(country_from_locale("en.UTF-8"), None);
        assert_eq!(country_from_locale(""), None);
    }

    #[test]
    fn override_wins() {
        let locator = LocaleCountryLocator::new(Some(" fr ".to_string()));
        assert_eq!(locator.current_country_iso(), Some("FR".to_string()));
    }

    #[test]
    fn blank_override_is_ignored() {
        let locator = LocaleCountryLocator::new(Some("  ".to_string()));
        assert!(locator.override_iso.is_none());
    }
}
