//! Clinic intake triage and department queue engine.
//!
//! Patients register with symptoms, receive a triage score and urgency tier,
//! and are issued a token in their department's waiting queue, optionally
//! bound to a preferred doctor.

pub mod clock;
pub mod config;
pub mod doctors;
pub mod error;
pub mod intake;
pub mod models;
pub mod queue;
pub mod store;
pub mod token_number;
pub mod triage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ClinicConfig;
pub use doctors::{AssignmentOutcome, DoctorAssignmentResolver};
pub use error::{ClinicError, Result};
pub use intake::{IntakeReceipt, IntakeService};
pub use models::{
    create_intake_request, Department, Doctor, DoctorRef, Gender, IntakeRequest, NewDoctor,
    Symptom, Token, TokenStatus, UrgencyTier,
};
pub use queue::DepartmentBoard;
pub use store::{ClinicStore, DoctorClaim, InMemoryStore};
pub use token_number::TokenNumberGenerator;
pub use triage::{SymptomCatalog, WaitTimeEstimator};
