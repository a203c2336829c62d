//! Persistence collaborator for symptoms, doctors and tokens.
//!
//! The engine only talks to `ClinicStore`. Counter mutations that must not
//! race (token sequence, doctor queue and preference counts) are single
//! operations on the trait so an implementation can make them atomic.

use crate::clock::{Clock, SystemClock};
use crate::config::ClinicConfig;
use crate::doctors::doctor_key;
use crate::error::{ClinicError, Result};
use crate::models::{Department, Doctor, NewDoctor, Symptom, Token, TokenStatus};
use crate::triage::SymptomCatalog;
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of trying to bind a doctor by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorClaim {
    /// Counters were incremented; carries the updated record.
    Claimed(Doctor),
    Unavailable(Doctor),
    NotFound,
}

pub trait ClinicStore: Send + Sync {
    /// Current time on the store's clock. Intake timestamps, token hour
    /// buckets and the daily doctor reset all read from here.
    fn now(&self) -> DateTime<Local>;

    /// Snapshot of the symptom catalog for scoring.
    fn symptom_catalog(&self) -> SymptomCatalog;

    /// Symptoms, heaviest first.
    fn list_symptoms(&self) -> Vec<Symptom>;

    fn add_symptom(&self, name: &str, weight: i64) -> Result<Symptom>;

    /// Doctors in roster order, with stale daily counters reset.
    fn list_doctors(&self) -> Vec<Doctor>;

    fn get_doctor(&self, id: Uuid) -> Result<Doctor>;

    fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor>;

    fn set_doctor_availability(&self, id: Uuid, available: bool) -> Result<Doctor>;

    /// Look up a doctor by normalized key and, if available, increment queue
    /// length and preference count in the same step.
    fn claim_doctor(&self, key: &str, now: DateTime<Local>) -> DoctorClaim;

    /// Revert a claim whose token was rejected.
    fn release_doctor(&self, id: Uuid);

    fn count_waiting_tokens(&self, department: Department) -> usize;

    fn count_all_tokens(&self) -> usize;

    /// Reserve the next token sequence number. Never returns the same value twice.
    fn next_token_sequence(&self) -> u64;

    fn create_token(&self, token: Token) -> Result<Token>;

    fn get_token(&self, token: &str) -> Result<Token>;

    fn update_token_status(&self, token: &str, status: TokenStatus) -> Result<Token>;

    /// All tokens, newest first.
    fn list_tokens(&self) -> Vec<Token>;
}

/// Process-local store guarded by `parking_lot` locks.
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    symptoms: RwLock<SymptomCatalog>,
    doctors: Mutex<Vec<Doctor>>,
    tokens: RwLock<HashMap<String, Token>>,
    token_sequence: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        InMemoryStore {
            clock,
            symptoms: RwLock::new(SymptomCatalog::new()),
            doctors: Mutex::new(Vec::new()),
            tokens: RwLock::new(HashMap::new()),
            token_sequence: AtomicU64::new(0),
        }
    }

    /// Store preloaded with the configured symptoms and roster.
    ///
    /// Doctors whose name is already present are skipped.
    pub fn seeded(config: &ClinicConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Self::with_clock(clock);
        *store.symptoms.write() = config.symptom_catalog()?;

        for doctor in config.new_doctors()? {
            match store.add_doctor(doctor) {
                Ok(doctor) => debug!(doctor = %doctor.name, "Seeded doctor"),
                Err(ClinicError::DuplicateName(name)) => {
                    debug!(doctor = %name, "Doctor already exists, skipping seed")
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            symptoms = store.symptoms.read().len(),
            doctors = store.doctors.lock().len(),
            "Store seeded"
        );
        Ok(store)
    }

    fn reset_stale_counters(doctors: &mut [Doctor], now: DateTime<Local>) {
        for doctor in doctors.iter_mut() {
            if doctor.reset_preference_count_if_new_day(now) {
                debug!(doctor = %doctor.name, "Reset daily preference count");
            }
        }
    }
}

impl ClinicStore for InMemoryStore {
    fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    fn symptom_catalog(&self) -> SymptomCatalog {
        self.symptoms.read().clone()
    }

    fn list_symptoms(&self) -> Vec<Symptom> {
        self.symptoms.read().symptoms_by_weight()
    }

    fn add_symptom(&self, name: &str, weight: i64) -> Result<Symptom> {
        let symptom = Symptom::new(name, weight)?;
        let symptom = self.symptoms.write().insert(symptom)?;
        info!(symptom = %symptom.name, weight = symptom.weight, "Added symptom");
        Ok(symptom)
    }

    fn list_doctors(&self) -> Vec<Doctor> {
        let mut doctors = self.doctors.lock();
        Self::reset_stale_counters(&mut doctors, self.clock.now());
        doctors.clone()
    }

    fn get_doctor(&self, id: Uuid) -> Result<Doctor> {
        let mut doctors = self.doctors.lock();
        let now = self.clock.now();
        let doctor = doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ClinicError::not_found(format!("Doctor {} not found", id)))?;
        doctor.reset_preference_count_if_new_day(now);
        Ok(doctor.clone())
    }

    fn add_doctor(&self, new: NewDoctor) -> Result<Doctor> {
        let mut doctors = self.doctors.lock();
        let key = doctor_key(&new.name);
        if doctors.iter().any(|d| doctor_key(&d.name) == key) {
            return Err(ClinicError::DuplicateName(new.name));
        }

        let doctor = Doctor::from_new(new, self.clock.now());
        doctors.push(doctor.clone());
        info!(
            doctor = %doctor.name,
            department = %doctor.department,
            "Added doctor"
        );
        Ok(doctor)
    }

    fn set_doctor_availability(&self, id: Uuid, available: bool) -> Result<Doctor> {
        let mut doctors = self.doctors.lock();
        let now = self.clock.now();
        let doctor = doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ClinicError::not_found(format!("Doctor {} not found", id)))?;

        doctor.reset_preference_count_if_new_day(now);
        doctor.is_available = available;
        info!(doctor = %doctor.name, available, "Updated doctor availability");
        Ok(doctor.clone())
    }

    fn claim_doctor(&self, key: &str, now: DateTime<Local>) -> DoctorClaim {
        let mut doctors = self.doctors.lock();
        let doctor = match doctors.iter_mut().find(|d| doctor_key(&d.name) == key) {
            Some(doctor) => doctor,
            None => return DoctorClaim::NotFound,
        };

        doctor.reset_preference_count_if_new_day(now);
        if !doctor.is_available {
            return DoctorClaim::Unavailable(doctor.clone());
        }

        doctor.current_queue_length += 1;
        doctor.preference_count_today += 1;
        DoctorClaim::Claimed(doctor.clone())
    }

    fn release_doctor(&self, id: Uuid) {
        let mut doctors = self.doctors.lock();
        if let Some(doctor) = doctors.iter_mut().find(|d| d.id == id) {
            doctor.current_queue_length = doctor.current_queue_length.saturating_sub(1);
            doctor.preference_count_today = doctor.preference_count_today.saturating_sub(1);
            debug!(doctor = %doctor.name, "Released doctor claim");
        }
    }

    fn count_waiting_tokens(&self, department: Department) -> usize {
        self.tokens
            .read()
            .values()
            .filter(|t| t.department == department && t.status == TokenStatus::Waiting)
            .count()
    }

    fn count_all_tokens(&self) -> usize {
        self.tokens.read().len()
    }

    fn next_token_sequence(&self) -> u64 {
        self.token_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn create_token(&self, token: Token) -> Result<Token> {
        let mut tokens = self.tokens.write();
        if tokens.contains_key(&token.token) {
            return Err(ClinicError::DuplicateToken(token.token));
        }

        // Keep reservations ahead of anything inserted with an explicit sequence.
        self.token_sequence.fetch_max(token.sequence, Ordering::SeqCst);
        tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    fn get_token(&self, token: &str) -> Result<Token> {
        self.tokens
            .read()
            .get(token)
            .cloned()
            .ok_or_else(|| ClinicError::not_found(format!("Token {} not found", token)))
    }

    fn update_token_status(&self, token: &str, status: TokenStatus) -> Result<Token> {
        let mut tokens = self.tokens.write();
        let record = tokens
            .get_mut(token)
            .ok_or_else(|| ClinicError::not_found(format!("Token {} not found", token)))?;

        if !record.status.can_advance_to(status) {
            return Err(ClinicError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        Ok(record.clone())
    }

    fn list_tokens(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.tokens.read().values().cloned().collect();
        tokens.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        tokens
    }
}
