/// Data models for the clinic intake system.
///
/// This module defines the records exchanged between the triage engine and
/// the persistence collaborator:
/// - Department, Gender, TokenStatus, UrgencyTier: closed enumerations
/// - Symptom: catalog entry with an urgency weight
/// - Doctor: staff member with queue and preference counters
/// - IntakeRequest: validated patient input
/// - Token: the issued queue ticket

use crate::doctors::strip_honorific;
use crate::error::{ClinicError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 120;
pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 10;
pub const MIN_PATIENTS_PER_HOUR: u32 = 1;
pub const MAX_PATIENTS_PER_HOUR: u32 = 10;

/// Clinical departments accepting intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    General,
    Cardiology,
    Neurology,
    Orthopedics,
    Pediatrics,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::General,
        Department::Cardiology,
        Department::Neurology,
        Department::Orthopedics,
        Department::Pediatrics,
    ];

    /// Convert a string to a Department, ignoring case.
    pub fn from_string(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "general" => Ok(Department::General),
            "cardiology" => Ok(Department::Cardiology),
            "neurology" => Ok(Department::Neurology),
            "orthopedics" => Ok(Department::Orthopedics),
            "pediatrics" => Ok(Department::Pediatrics),
            _ => Err(ClinicError::validation(format!(
                "Invalid department: '{}'. Must be one of: General, Cardiology, Neurology, Orthopedics, Pediatrics",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Department::General => "General",
            Department::Cardiology => "Cardiology",
            Department::Neurology => "Neurology",
            Department::Orthopedics => "Orthopedics",
            Department::Pediatrics => "Pediatrics",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_string(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(ClinicError::validation(format!(
                "Invalid gender: '{}'. Must be one of: Male, Female, Other",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Lifecycle of a token. Declaration order is the only allowed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStatus {
    Waiting,
    InProgress,
    Completed,
}

impl TokenStatus {
    pub const ALL: [TokenStatus; 3] = [
        TokenStatus::Waiting,
        TokenStatus::InProgress,
        TokenStatus::Completed,
    ];

    pub fn from_string(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "waiting" => Ok(TokenStatus::Waiting),
            "in-progress" | "in progress" | "inprogress" => Ok(TokenStatus::InProgress),
            "completed" => Ok(TokenStatus::Completed),
            _ => Err(ClinicError::validation(format!(
                "Invalid status: '{}'. Must be one of: waiting, in-progress, completed",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::InProgress => "in-progress",
            TokenStatus::Completed => "completed",
        }
    }

    /// Whether a token in this status may be moved to `next`.
    ///
    /// Re-applying the current status is accepted as a no-op.
    pub fn can_advance_to(&self, next: TokenStatus) -> bool {
        next >= *self
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse urgency bucket derived from the triage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyTier {
    Low,
    Moderate,
    Critical,
}

impl UrgencyTier {
    pub fn name(&self) -> &'static str {
        match self {
            UrgencyTier::Low => "Low",
            UrgencyTier::Moderate => "Moderate",
            UrgencyTier::Critical => "Critical",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A catalog entry mapping a symptom to its urgency weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    pub weight: u8,
    pub created_at: DateTime<Local>,
}

impl Symptom {
    /// Create a new symptom with validation. The name is stored lowercased.
    pub fn new(name: &str, weight: i64) -> Result<Self> {
        let name = normalize_symptom(name);
        if name.is_empty() {
            return Err(ClinicError::validation("Symptom name cannot be empty"));
        }
        if weight < MIN_WEIGHT as i64 || weight > MAX_WEIGHT as i64 {
            return Err(ClinicError::validation(format!(
                "Triage weight must be between {} and {}, got {}",
                MIN_WEIGHT, MAX_WEIGHT, weight
            )));
        }

        Ok(Symptom {
            name,
            weight: weight as u8,
            created_at: Local::now(),
        })
    }
}

/// Lowercase and trim a symptom name.
pub fn normalize_symptom(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Weak reference from a token to the doctor it was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRef {
    pub id: Uuid,
    pub name: String,
}

/// Validated input for adding a doctor to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctor {
    pub name: String,
    pub department: Department,
    pub specialization: String,
    pub max_patients_per_hour: u32,
}

impl NewDoctor {
    /// Create a new doctor request. A leading "Dr." is stripped from the name.
    pub fn new(
        name: &str,
        department: &str,
        specialization: &str,
        max_patients_per_hour: i64,
    ) -> Result<Self> {
        let name = strip_honorific(name);
        if name.is_empty() {
            return Err(ClinicError::validation("Doctor name cannot be empty"));
        }
        let department = Department::from_string(department)?;
        let specialization = specialization.trim();
        if specialization.is_empty() {
            return Err(ClinicError::validation("Specialization cannot be empty"));
        }
        if max_patients_per_hour < MIN_PATIENTS_PER_HOUR as i64
            || max_patients_per_hour > MAX_PATIENTS_PER_HOUR as i64
        {
            return Err(ClinicError::validation(format!(
                "Max patients per hour must be between {} and {}, got {}",
                MIN_PATIENTS_PER_HOUR, MAX_PATIENTS_PER_HOUR, max_patients_per_hour
            )));
        }

        Ok(NewDoctor {
            name,
            department,
            specialization: specialization.to_string(),
            max_patients_per_hour: max_patients_per_hour as u32,
        })
    }
}

/// A staff member who can be preferred at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub department: Department,
    pub specialization: String,
    pub max_patients_per_hour: u32,
    pub current_queue_length: u32,
    pub is_available: bool,
    pub preference_count_today: u32,
    pub last_reset_date: DateTime<Local>,
}

impl Doctor {
    pub fn from_new(new: NewDoctor, now: DateTime<Local>) -> Self {
        Doctor {
            id: Uuid::new_v4(),
            name: new.name,
            department: new.department,
            specialization: new.specialization,
            max_patients_per_hour: new.max_patients_per_hour,
            current_queue_length: 0,
            is_available: true,
            preference_count_today: 0,
            last_reset_date: now,
        }
    }

    /// Zero the preference counter when `now` falls on a different calendar
    /// day than the last reset. Returns true if a reset happened.
    pub fn reset_preference_count_if_new_day(&mut self, now: DateTime<Local>) -> bool {
        if now.date_naive() == self.last_reset_date.date_naive() {
            return false;
        }
        self.preference_count_today = 0;
        self.last_reset_date = now;
        true
    }

    pub fn to_ref(&self) -> DoctorRef {
        DoctorRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.name)
    }
}

/// A patient's validated intake request.
///
/// Fields are only reachable inside the crate; build one with
/// `IntakeRequest::new` or `create_intake_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRequest {
    pub(crate) patient_name: String,
    pub(crate) age: u8,
    pub(crate) gender: Gender,
    pub(crate) department: Department,
    pub(crate) symptoms: Vec<String>,
    pub(crate) preferred_doctor: Option<String>,
}

impl IntakeRequest {
    /// Create a new intake request with validation.
    pub fn new(
        patient_name: &str,
        age: i64,
        gender: Gender,
        department: Department,
        symptoms: Vec<String>,
        preferred_doctor: Option<String>,
    ) -> Result<Self> {
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(ClinicError::validation(format!(
                "Age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, age
            )));
        }

        IntakeRequest {
            patient_name: patient_name.to_string(),
            age: age as u8,
            gender,
            department,
            symptoms,
            preferred_doctor,
        }
        .validated()
    }

    /// Check the name, age and symptoms, returning the request with the name
    /// trimmed and the symptoms normalized.
    pub fn validated(self) -> Result<Self> {
        let patient_name = self.patient_name.trim();
        if patient_name.is_empty() {
            return Err(ClinicError::validation("Patient name cannot be empty"));
        }
        if i64::from(self.age) > MAX_AGE {
            return Err(ClinicError::validation(format!(
                "Age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, self.age
            )));
        }

        let symptoms: Vec<String> = self
            .symptoms
            .iter()
            .map(|s| normalize_symptom(s))
            .filter(|s| !s.is_empty())
            .collect();
        if symptoms.is_empty() {
            return Err(ClinicError::validation("At least one symptom is required"));
        }

        Ok(IntakeRequest {
            patient_name: patient_name.to_string(),
            symptoms,
            ..self
        })
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn department(&self) -> Department {
        self.department
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn preferred_doctor(&self) -> Option<&str> {
        self.preferred_doctor.as_deref()
    }
}

/// Factory function to create an intake request from raw form values.
pub fn create_intake_request(
    patient_name: &str,
    age: i64,
    gender: &str,
    department: &str,
    symptoms: &[&str],
    preferred_doctor: Option<&str>,
) -> Result<IntakeRequest> {
    let gender = Gender::from_string(gender)?;
    let department = Department::from_string(department)?;

    IntakeRequest::new(
        patient_name,
        age,
        gender,
        department,
        symptoms.iter().map(|s| s.to_string()).collect(),
        preferred_doctor.map(str::to_string),
    )
}

/// An issued intake token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub sequence: u64,
    pub patient_name: String,
    pub age: u8,
    pub gender: Gender,
    pub department: Department,
    pub symptoms: Vec<String>,
    pub triage_score: u8,
    pub urgency_tier: UrgencyTier,
    pub status: TokenStatus,
    pub estimated_wait_minutes: u32,
    pub doctor: Option<DoctorRef>,
    pub created_at: DateTime<Local>,
}
