//! Recording policy gate

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::domain::policy::CountryPolicyTable;

use super::ports::{CountryLocator, PolicySource};

/// Whether call recording was compiled in
pub const fn recording_enabled_at_build() -> bool {
    cfg!(feature = "call-recording")
}

/// Decides whether recording is available and legal where the user is.
///
/// The country table is loaded lazily on first use. A malformed resource
/// leaves it empty, so every lookup is denied until a later load succeeds.
pub struct PolicyGate<S, L>
where
    S: PolicySource,
    L: CountryLocator,
{
    enabled: bool,
    source: S,
    locator: L,
    table: Mutex<CountryPolicyTable>,
}

impl<S, L> PolicyGate<S, L>
where
    S: PolicySource,
    L: CountryLocator,
{
    pub fn new(enabled: bool, source: S, locator: L) -> Self {
        Self {
            enabled,
            source,
            locator,
            table: Mutex::new(CountryPolicyTable::new()),
        }
    }

    /// Gate driven by the `call-recording` build feature
    pub fn from_build(source: S, locator: L) -> Self {
        Self::new(recording_enabled_at_build(), source, locator)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether recording is permitted in the country reported by the locator
    pub fn can_record_in_current_country(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.locator.current_country_iso() {
            Some(iso) => self.can_record_in(&iso),
            None => {
                debug!("Current country unknown, recording not permitted");
                false
            }
        }
    }

    /// Whether recording is permitted in the given country
    pub fn can_record_in(&self, iso: &str) -> bool {
        if !self.enabled {
            return false;
        }

        let mut table = match self.table.lock() {
            Ok(table) => table,
            Err(poisoned) => poisoned.into_inner(),
        };

        if table.is_empty() {
            self.load_into(&mut table);
        }

        let allowed = table.allows(iso);
        debug!("Recording in {} allowed: {}", iso, allowed);
        allowed
    }

    fn load_into(&self, table: &mut CountryPolicyTable) {
        let loaded = self
            .source
            .records()
            .and_then(|records| CountryPolicyTable::from_records(&records));

        match loaded {
            Ok(loaded) => {
                debug!("Loaded recording policy for {} countries", loaded.len());
                *table = loaded;
            }
            Err(e) => {
                table.clear();
                warn!("Recording policy unavailable, denying everywhere: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PolicyError;
    use crate::domain::policy::PolicyRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeSource {
        records: Mutex<Vec<PolicyRecord>>,
        loads: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(records: Vec<PolicyRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                loads: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl PolicySource for FakeSource {
        fn records(&self) -> Result<Vec<PolicyRecord>, PolicyError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.lock().unwrap().clone())
        }
    }

    struct BrokenSource;

    impl PolicySource for BrokenSource {
        fn records(&self) -> Result<Vec<PolicyRecord>, PolicyError> {
            Err(PolicyError::ReadError("missing resource".to_string()))
        }
    }

    struct FixedLocator(Option<&'static str>);

    impl CountryLocator for FixedLocator {
        fn current_country_iso(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn us_de() -> Vec<PolicyRecord> {
        vec![PolicyRecord::new("US", "true"), PolicyRecord::new("DE", "false")]
    }

    #[test]
    fn allowed_country() {
        let gate = PolicyGate::new(true, FakeSource::new(us_de()), FixedLocator(Some("US")));
        assert!(gate.can_record_in_current_country());
    }

    #[test]
    fn denied_country() {
        let gate = PolicyGate::new(true, FakeSource::new(us_de()), FixedLocator(Some("DE")));
        assert!(!gate.can_record_in_current_country());
    }

    #[test]
    fn absent_country_is_denied() {
        let gate = PolicyGate::new(true, FakeSource::new(us_de()), FixedLocator(Some("FR")));
        assert!(!gate.can_record_in_current_country());
    }

    #[test]
    fn unknown_location_is_denied() {
        let gate = PolicyGate::new(true, FakeSource::new(us_de()), FixedLocator(None));
        assert!(!gate.can_record_in_current_country());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let gate = PolicyGate::new(true, FakeSource::new(us_de()), FixedLocator(Some("us")));
        assert!(gate.can_record_in_current_country());
    }

    #[test]
    fn disabled_gate_never_loads() {
        let source = FakeSource::new(us_de());
        let loads = Arc::clone(&source.loads);
        let gate = PolicyGate::new(false, source, FixedLocator(Some("US")));

        assert!(!gate.is_enabled());
        assert!(!gate.can_record_in_current_country());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn table_is_loaded_once() {
        let source = FakeSource::new(us_de());
        let loads = Arc::clone(&source.loads);
        let gate = PolicyGate::new(true, source, FixedLocator(Some("US")));

        assert!(gate.can_record_in_current_country());
        assert!(gate.can_record_in("US"));
        assert!(!gate.can_record_in("DE"));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_entry_denies_everything_until_reload() {
        let source = FakeSource::new(vec![
            PolicyRecord::new("US", "true"),
            PolicyRecord::new("DE", "maybe"),
        ]);
        let gate = PolicyGate::new(true, source, FixedLocator(Some("US")));

        assert!(!gate.can_record_in_current_country());
        assert!(!gate.can_record_in("US"));
        assert!(!gate.can_record_in("DE"));

        *gate.source.records.lock().unwrap() = us_de();
        assert!(gate.can_record_in("US"));
    }

    #[test]
    fn unreadable_resource_denies() {
        let gate = PolicyGate::new(true, BrokenSource, FixedLocator(Some("US")));
        assert!(!gate.can_record_in_current_country());
    }

    #[test]
    fn build_flag_matches_feature() {
        assert_eq!(recording_enabled_at_build(), cfg!(feature = "call-recording"));
    }
}
