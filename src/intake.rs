/// Patient intake orchestration.
///
/// This module provides the IntakeService which turns a validated intake
/// request into a stored queue token: score, tier, wait estimate, optional
/// doctor binding and token number, in that order.

use crate::doctors::{AssignmentOutcome, DoctorAssignmentResolver};
use crate::error::Result;
use crate::models::{Department, Doctor, IntakeRequest, NewDoctor, Symptom, Token, TokenStatus};
use crate::queue::{self, DepartmentBoard};
use crate::store::ClinicStore;
use crate::token_number::TokenNumberGenerator;
use crate::triage::{self, WaitTimeEstimator};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a successful intake.
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    pub token: Token,
    /// Waiting tokens in the department when this one was issued.
    pub queue_depth: usize,
    pub assignment: AssignmentOutcome,
}

pub struct IntakeService<S: ClinicStore> {
    store: Arc<S>,
    estimator: WaitTimeEstimator,
}

impl<S: ClinicStore> IntakeService<S> {
    /// The service has no clock of its own; time comes from `store.now()`.
    pub fn new(store: Arc<S>, estimator: WaitTimeEstimator) -> Self {
        IntakeService { store, estimator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn estimator(&self) -> &WaitTimeEstimator {
        &self.estimator
    }

    /// Register a patient and issue a waiting token.
    ///
    /// All validation happens before any counter is touched. An unknown or
    /// unavailable preferred doctor does not fail the intake; the token is
    /// issued unbound and the receipt says why.
    pub fn register(&self, request: IntakeRequest) -> Result<IntakeReceipt> {
        let request = request.validated()?;
        let now = self.store.now();

        let catalog = self.store.symptom_catalog();
        let triage_score = triage::score(&request.symptoms, &catalog)?;
        let urgency_tier = triage::classify(triage_score);
        debug!(
            patient = %request.patient_name,
            score = triage_score,
            tier = %urgency_tier,
            "Calculated triage"
        );

        let queue_depth = self.store.count_waiting_tokens(request.department);
        let estimated_wait_minutes = self.estimator.estimate(queue_depth, request.department);
        debug!(
            department = %request.department,
            queue_depth,
            wait_minutes = estimated_wait_minutes,
            "Queue stats"
        );

        let resolver = DoctorAssignmentResolver::new(self.store.as_ref());
        let assignment = resolver.assign(
            request.preferred_doctor.as_deref(),
            request.department,
            now,
        );

        let (token_number, sequence) = TokenNumberGenerator::new(self.store.as_ref()).next(now);

        let token = Token {
            token: token_number,
            sequence,
            patient_name: request.patient_name,
            age: request.age,
            gender: request.gender,
            department: request.department,
            symptoms: request.symptoms,
            triage_score,
            urgency_tier,
            status: TokenStatus::Waiting,
            estimated_wait_minutes,
            doctor: assignment.doctor().cloned(),
            created_at: now,
        };

        let token = match self.store.create_token(token) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token rejected, releasing doctor claim");
                resolver.release(&assignment);
                return Err(e);
            }
        };

        info!(
            token = %token.token,
            department = %token.department,
            score = token.triage_score,
            tier = %token.urgency_tier,
            wait_minutes = token.estimated_wait_minutes,
            doctor = token.doctor.as_ref().map(|d| d.name.as_str()).unwrap_or("-"),
            "Issued token"
        );

        Ok(IntakeReceipt {
            token,
            queue_depth,
            assignment,
        })
    }

    /// Move a token forward through waiting -> in-progress -> completed.
    pub fn update_status(&self, token: &str, status: TokenStatus) -> Result<Token> {
        let updated = self.store.update_token_status(token, status)?;
        info!(token = %updated.token, status = %updated.status, "Updated token status");
        Ok(updated)
    }

    pub fn department_board(&self, department: Department) -> DepartmentBoard {
        queue::department_board(&self.store.list_tokens(), department)
    }

    pub fn queue_sizes(&self) -> BTreeMap<Department, usize> {
        queue::queue_sizes(&self.store.list_tokens())
    }

    pub fn list_tokens(&self) -> Vec<Token> {
        self.store.list_tokens()
    }

    /// All tokens, newest first, as pretty JSON.
    pub fn export_tokens_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.list_tokens())?)
    }

    pub fn list_symptoms(&self) -> Vec<Symptom> {
        self.store.list_symptoms()
    }

    pub fn add_symptom(&self, name: &str, weight: i64) -> Result<Symptom> {
        self.store.add_symptom(name, weight)
    }

    pub fn list_doctors(&self) -> Vec<Doctor> {
        self.store.list_doctors()
    }

    pub fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor> {
        self.store.add_doctor(doctor)
    }

    pub fn set_doctor_availability(&self, id: Uuid, available: bool) -> Result<Doctor> {
        self.store.set_doctor_availability(id, available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::config::ClinicConfig;
    use crate::error::ClinicError;
    use crate::models::{create_intake_request, Gender, UrgencyTier};
    use crate::store::InMemoryStore;
    use chrono::{Local, TimeZone};

    fn service() -> IntakeService<InMemoryStore> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2024, 5, 1, 9, 15, 0).unwrap(),
        ));
        let config = ClinicConfig::default();
        let store = Arc::new(InMemoryStore::seeded(&config, clock.clone()).unwrap());
        IntakeService::new(store, config.wait_time_estimator().unwrap())
    }

    #[test]
    fn test_register_builds_waiting_token() {
        let service = service();
        let request =
            create_intake_request("Ann Lee", 52, "Female", "Neurology", &["Headache"], None)
                .unwrap();
        let receipt = service.register(request).unwrap();

        assert_eq!(receipt.token.token, "#J0001");
        assert_eq!(receipt.token.triage_score, 3);
        assert_eq!(receipt.token.urgency_tier, UrgencyTier::Low);
        assert_eq!(receipt.token.status, TokenStatus::Waiting);
        assert_eq!(receipt.token.estimated_wait_minutes, 0);
        assert_eq!(receipt.assignment, AssignmentOutcome::NoPreference);
    }

    #[test]
    fn test_wait_estimate_uses_depth_at_intake() {
        let service = service();
        for name in ["A", "B", "C"] {
            let request =
                create_intake_request(name, 30, "Male", "Neurology", &["cough"], None).unwrap();
            service.register(request).unwrap();
        }

        let waits: Vec<u32> = service
            .list_tokens()
            .iter()
            .rev()
            .map(|t| t.estimated_wait_minutes)
            .collect();
        assert_eq!(waits, vec![0, 20, 40]);
    }

    #[test]
    fn test_status_update_frees_queue_slot() {
        let service = service();
        let request = create_intake_request("A", 30, "Male", "General", &["cough"], None).unwrap();
        let first = service.register(request).unwrap().token;
        service.update_status(&first.token, TokenStatus::InProgress).unwrap();

        let request = create_intake_request("B", 30, "Male", "General", &["cough"], None).unwrap();
        let second = service.register(request).unwrap();
        assert_eq!(second.queue_depth, 0);
        assert_eq!(second.token.estimated_wait_minutes, 0);
    }

    #[test]
    fn test_rejected_token_releases_doctor() {
        let service = service();
        // Occupy the number the next intake will be given.
        let squatter = create_intake_request("Z", 30, "Male", "General", &["cough"], None).unwrap();
        let mut taken = service.register(squatter).unwrap().token;
        taken.token = "#J0002".to_string();
        taken.sequence = 0;
        service.store().create_token(taken).unwrap();

        let request = create_intake_request(
            "A",
            30,
            "Male",
            "General",
            &["cough"],
            Some("Dr. John Smith"),
        )
        .unwrap();
        let result = service.register(request);
        assert!(matches!(result, Err(ClinicError::DuplicateToken(_))));

        let smith = service
            .list_doctors()
            .into_iter()
            .find(|d| d.name == "John Smith")
            .unwrap();
        assert_eq!(smith.current_queue_length, 0);
        assert_eq!(smith.preference_count_today, 0);
    }

    #[test]
    fn test_export_json() {
        let service = service();
        let request =
            create_intake_request("A", 30, "Other", "Pediatrics", &["vomiting"], None).unwrap();
        service.register(request).unwrap();

        let json = service.export_tokens_json().unwrap();
        assert!(json.contains("\"status\": \"waiting\""));
        assert!(json.contains("\"urgency_tier\": \"Moderate\""));
    }

    #[test]
    fn test_hand_built_request_is_validated() {
        let service = service();
        let request = IntakeRequest {
            patient_name: String::new(),
            age: 200,
            gender: Gender::Other,
            department: Department::Cardiology,
            symptoms: vec!["  CHEST PAIN ".to_string()],
            preferred_doctor: Some("Dr. John Smith".to_string()),
        };
        let result = service.register(request);
        assert!(matches!(result, Err(ClinicError::Validation(_))));

        let request = IntakeRequest {
            patient_name: "Ann Lee".to_string(),
            age: 200,
            gender: Gender::Female,
            department: Department::Cardiology,
            symptoms: vec!["chest pain".to_string()],
            preferred_doctor: None,
        };
        assert!(matches!(
            service.register(request),
            Err(ClinicError::Validation(_))
        ));

        assert!(service.list_tokens().is_empty());
        let smith = service
            .list_doctors()
            .into_iter()
            .find(|d| d.name == "John Smith")
            .unwrap();
        assert_eq!(smith.current_queue_length, 0);
    }

    #[test]
    fn test_hand_built_request_is_normalized() {
        let service = service();
        let request = IntakeRequest {
            patient_name: "  Ann Lee ".to_string(),
            age: 40,
            gender: Gender::Female,
            department: Department::Cardiology,
            symptoms: vec!["  CHEST PAIN ".to_string(), "   ".to_string()],
            preferred_doctor: None,
        };
        let token = service.register(request).unwrap().token;
        assert_eq!(token.patient_name, "Ann Lee");
        assert_eq!(token.symptoms, vec!["chest pain".to_string()]);
        assert_eq!(token.triage_score, 9);
    }

    #[test]
    fn test_service_reads_time_from_store() {
        let clock = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
        ));
        let config = ClinicConfig::default();
        let store = Arc::new(InMemoryStore::seeded(&config, clock.clone()).unwrap());
        let service = IntakeService::new(store, config.wait_time_estimator().unwrap());

        let request =
            create_intake_request("A", 30, "Male", "General", &["cough"], None).unwrap();
        let token = service.register(request).unwrap().token;
        assert_eq!(token.token, "#O0001");
        assert_eq!(token.created_at, clock.now());
    }
}
