//! Preferred-doctor resolution at intake.
//!
//! Binding is best-effort: an unknown or unavailable doctor never fails the
//! intake, the token simply enters the department queue unbound.

use crate::models::{Department, DoctorRef};
use crate::store::{ClinicStore, DoctorClaim};
use chrono::{DateTime, Local};
use tracing::{info, warn};

/// Form value meaning "any doctor".
pub const NO_PREFERENCE: &str = "no-preference";

/// Strip a leading "Dr." (or "Dr ") honorific and surrounding whitespace.
pub fn strip_honorific(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();
    // Both prefixes are three ASCII bytes, so slicing at 3 stays on a char boundary.
    let rest = if lower.starts_with("dr.") || lower.starts_with("dr ") {
        &trimmed[3..]
    } else {
        trimmed
    };
    rest.trim().to_string()
}

/// Normalize a requested doctor name, or `None` if no doctor was requested.
pub fn normalize_doctor_name(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty()
        || raw.eq_ignore_ascii_case(NO_PREFERENCE)
        || raw.eq_ignore_ascii_case("no preference")
    {
        return None;
    }
    let name = strip_honorific(raw);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Lookup key for a doctor: the honorific-free name, case-folded.
pub fn doctor_key(name: &str) -> String {
    strip_honorific(name).to_lowercase()
}

/// What happened to a patient's doctor preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    NoPreference,
    Assigned(DoctorRef),
    /// No doctor with that name is on the roster.
    UnknownDoctor(String),
    /// The doctor exists but is marked unavailable.
    Unavailable(String),
}

impl AssignmentOutcome {
    pub fn doctor(&self) -> Option<&DoctorRef> {
        match self {
            AssignmentOutcome::Assigned(doctor) => Some(doctor),
            _ => None,
        }
    }

    /// True when a preference was given but could not be honored.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            AssignmentOutcome::UnknownDoctor(_) | AssignmentOutcome::Unavailable(_)
        )
    }
}

/// Binds intake tokens to a preferred doctor.
pub struct DoctorAssignmentResolver<'a, S: ClinicStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ClinicStore + ?Sized> DoctorAssignmentResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        DoctorAssignmentResolver { store }
    }

    /// Resolve a preference into a binding.
    ///
    /// On success the doctor's queue length and daily preference count have
    /// already been incremented by the store in the same critical section as
    /// the availability check. The doctor's department is not compared with
    /// the intake department.
    pub fn assign(
        &self,
        preferred: Option<&str>,
        department: Department,
        now: DateTime<Local>,
    ) -> AssignmentOutcome {
        let name = match normalize_doctor_name(preferred) {
            Some(name) => name,
            None => return AssignmentOutcome::NoPreference,
        };

        match self.store.claim_doctor(&doctor_key(&name), now) {
            DoctorClaim::Claimed(doctor) => {
                info!(
                    doctor = %doctor.name,
                    department = %department,
                    queue_length = doctor.current_queue_length,
                    preferences_today = doctor.preference_count_today,
                    "Assigned preferred doctor"
                );
                AssignmentOutcome::Assigned(doctor.to_ref())
            }
            DoctorClaim::Unavailable(doctor) => {
                warn!(doctor = %doctor.name, "Preferred doctor not available");
                AssignmentOutcome::Unavailable(doctor.name)
            }
            DoctorClaim::NotFound => {
                warn!(doctor = %name, "Preferred doctor not found");
                AssignmentOutcome::UnknownDoctor(name)
            }
        }
    }

    /// Undo a successful claim whose token was never created.
    pub fn release(&self, outcome: &AssignmentOutcome) {
        if let Some(doctor) = outcome.doctor() {
            self.store.release_doctor(doctor.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDoctor;
    use crate::store::InMemoryStore;

    fn store_with_smith() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_doctor(NewDoctor::new("John Smith", "General", "Family Medicine", 4).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_strip_honorific() {
        assert_eq!(strip_honorific("Dr. John Smith"), "John Smith");
        assert_eq!(strip_honorific("dr.John Smith"), "John Smith");
        assert_eq!(strip_honorific("DR John Smith"), "John Smith");
        assert_eq!(strip_honorific("  John Smith "), "John Smith");
        assert_eq!(strip_honorific("Drake Bell"), "Drake Bell");
        assert_eq!(strip_honorific("Dr"), "Dr");
    }

    #[test]
    fn test_normalize_sentinels() {
        assert_eq!(normalize_doctor_name(None), None);
        assert_eq!(normalize_doctor_name(Some("no-preference")), None);
        assert_eq!(normalize_doctor_name(Some("No Preference")), None);
        assert_eq!(normalize_doctor_name(Some("  ")), None);
        assert_eq!(
            normalize_doctor_name(Some("Dr. Sarah Johnson")),
            Some("Sarah Johnson".to_string())
        );
    }

    #[test]
    fn test_assign_available_doctor_increments_counters() {
        let store = store_with_smith();
        let resolver = DoctorAssignmentResolver::new(&store);

        let outcome = resolver.assign(Some("Dr. john smith"), Department::General, Local::now());
        assert_eq!(outcome.doctor().map(|d| d.name.as_str()), Some("John Smith"));

        let doctor = &store.list_doctors()[0];
        assert_eq!(doctor.current_queue_length, 1);
        assert_eq!(doctor.preference_count_today, 1);
    }

    #[test]
    fn test_assign_matches_exact_name_only() {
        let store = store_with_smith();
        let resolver = DoctorAssignmentResolver::new(&store);

        let outcome = resolver.assign(Some("John"), Department::General, Local::now());
        assert_eq!(outcome, AssignmentOutcome::UnknownDoctor("John".to_string()));
        assert_eq!(store.list_doctors()[0].current_queue_length, 0);
    }

    #[test]
    fn test_assign_unavailable_doctor_falls_back() {
        let store = store_with_smith();
        let id = store.list_doctors()[0].id;
        store.set_doctor_availability(id, false).unwrap();

        let resolver = DoctorAssignmentResolver::new(&store);
        let outcome = resolver.assign(Some("John Smith"), Department::General, Local::now());
        assert!(outcome.is_fallback());
        assert!(outcome.doctor().is_none());

        let doctor = &store.list_doctors()[0];
        assert_eq!(doctor.current_queue_length, 0);
        assert_eq!(doctor.preference_count_today, 0);
    }

    #[test]
    fn test_no_preference_touches_nothing() {
        let store = store_with_smith();
        let resolver = DoctorAssignmentResolver::new(&store);
        assert_eq!(
            resolver.assign(Some(NO_PREFERENCE), Department::General, Local::now()),
            AssignmentOutcome::NoPreference
        );
        assert_eq!(store.list_doctors()[0].current_queue_length, 0);
    }

    #[test]
    fn test_release_reverts_claim() {
        let store = store_with_smith();
        let resolver = DoctorAssignmentResolver::new(&store);
        let outcome = resolver.assign(Some("John Smith"), Department::General, Local::now());
        resolver.release(&outcome);

        let doctor = &store.list_doctors()[0];
        assert_eq!(doctor.current_queue_length, 0);
        assert_eq!(doctor.preference_count_today, 0);
    }
}
