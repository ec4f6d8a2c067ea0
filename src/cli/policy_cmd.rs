//! Policy command handler

use std::path::PathBuf;

use crate::application::ports::{CountryLocator, PolicySource};
use crate::application::PolicyGate;
use crate::infrastructure::{LocaleCountryLocator, TomlPolicySource};

use super::presenter::Presenter;

/// Print whether recording is permitted in the selected country.
///
/// Returns the verdict; an unknown country is an error.
pub fn handle_policy_command(
    file: Option<PathBuf>,
    country: Option<String>,
    presenter: &Presenter,
) -> Result<bool, String> {
    let source = match file {
        Some(path) => TomlPolicySource::from_file(path),
        None => TomlPolicySource::embedded(),
    };
    let locator = LocaleCountryLocator::new(country);
    let gate = PolicyGate::from_build(source, locator.clone());
    check(&gate, &locator, presenter)
}

fn check<S, L>(gate: &PolicyGate<S, L>, locator: &L, presenter: &Presenter) -> Result<bool, String>
where
    S: PolicySource,
    L: CountryLocator,
{
    if !gate.is_enabled() {
        presenter.output("disabled");
        presenter.warn("Call recording is not enabled in this build");
        return Ok(false);
    }

    let iso = locator.current_country_iso().ok_or_else(|| {
        "Could not determine the current country. Pass --country or set CALL_RECORDER_COUNTRY"
            .to_string()
    })?;

    let allowed = gate.can_record_in(&iso);
    presenter.output(&format!(
        "{}: {}",
        iso,
        if allowed { "allowed" } else { "denied" }
    ));
    Ok(allowed)
}
