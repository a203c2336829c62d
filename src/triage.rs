//! Triage scoring, tier classification and wait-time estimation.
//!
//! Everything here is pure: the catalog is passed in by the caller and no
//! function touches shared state.

use crate::error::{ClinicError, Result};
use crate::models::{normalize_symptom, Department, Symptom, UrgencyTier};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Weight used for symptoms missing from the catalog.
pub const UNKNOWN_SYMPTOM_WEIGHT: u8 = 1;

/// Fallback average consultation time for departments without an entry.
pub const FALLBACK_CONSULTATION_MINUTES: u32 = 15;

/// Symptom pairs that override the per-symptom maximum. First match wins.
const COMBINATION_OVERRIDES: [(&str, &str, u8); 2] = [
    ("fever", "stiff neck", 9),
    ("cough", "chest pain", 8),
];

/// Built-in symptom weights used when no catalog is configured.
pub const DEFAULT_SYMPTOM_WEIGHTS: [(&str, u8); 11] = [
    ("chest pain", 9),
    ("shortness of breath", 8),
    ("severe bleeding", 10),
    ("unconsciousness", 10),
    ("high fever", 6),
    ("vomiting", 5),
    ("mild fever", 4),
    ("headache", 3),
    ("cough", 2),
    ("sore throat", 2),
    ("stiff neck", 7),
];

/// Built-in average consultation minutes per department.
pub const DEFAULT_CONSULTATION_MINUTES: [(Department, u32); 5] = [
    (Department::General, 10),
    (Department::Cardiology, 15),
    (Department::Neurology, 20),
    (Department::Orthopedics, 15),
    (Department::Pediatrics, 12),
];

/// Case-insensitive mapping from symptom name to urgency weight.
#[derive(Debug, Clone, Default)]
pub struct SymptomCatalog {
    symptoms: HashMap<String, Symptom>,
}

impl SymptomCatalog {
    pub fn new() -> Self {
        SymptomCatalog {
            symptoms: HashMap::new(),
        }
    }

    /// Catalog preloaded with the built-in weights.
    pub fn with_defaults() -> Self {
        let mut catalog = SymptomCatalog::new();
        for (name, weight) in DEFAULT_SYMPTOM_WEIGHTS {
            if let Ok(symptom) = Symptom::new(name, weight as i64) {
                catalog.symptoms.insert(symptom.name.clone(), symptom);
            }
        }
        catalog
    }

    /// Add a symptom. Names collide case-insensitively.
    pub fn insert(&mut self, symptom: Symptom) -> Result<Symptom> {
        if self.symptoms.contains_key(&symptom.name) {
            return Err(ClinicError::DuplicateName(format!(
                "A symptom named '{}' already exists",
                symptom.name
            )));
        }
        self.symptoms.insert(symptom.name.clone(), symptom.clone());
        Ok(symptom)
    }

    pub fn get(&self, name: &str) -> Option<&Symptom> {
        self.symptoms.get(&normalize_symptom(name))
    }

    /// Weight of a symptom, or `UNKNOWN_SYMPTOM_WEIGHT` if not cataloged.
    pub fn weight_of(&self, name: &str) -> u8 {
        self.get(name)
            .map(|s| s.weight)
            .unwrap_or(UNKNOWN_SYMPTOM_WEIGHT)
    }

    /// All symptoms, heaviest first, then by name.
    pub fn symptoms_by_weight(&self) -> Vec<Symptom> {
        let mut symptoms: Vec<Symptom> = self.symptoms.values().cloned().collect();
        symptoms.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
        symptoms
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}

/// Compute the priority score for a list of reported symptoms.
///
/// Combination overrides are checked first; otherwise the score is the
/// maximum catalog weight among the symptoms, so one severe symptom
/// dominates any number of mild ones.
pub fn score<S: AsRef<str>>(symptoms: &[S], catalog: &SymptomCatalog) -> Result<u8> {
    let normalized: HashSet<String> = symptoms
        .iter()
        .map(|s| normalize_symptom(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();

    if normalized.is_empty() {
        return Err(ClinicError::validation("At least one symptom is required"));
    }

    for (first, second, override_score) in COMBINATION_OVERRIDES {
        if normalized.contains(first) && normalized.contains(second) {
            return Ok(override_score);
        }
    }

    Ok(normalized
        .iter()
        .map(|s| catalog.weight_of(s))
        .max()
        .unwrap_or(UNKNOWN_SYMPTOM_WEIGHT))
}

/// Map a priority score onto its urgency tier.
pub fn classify(score: u8) -> UrgencyTier {
    match score {
        s if s >= 8 => UrgencyTier::Critical,
        s if s >= 5 => UrgencyTier::Moderate,
        _ => UrgencyTier::Low,
    }
}

/// Estimates waiting minutes from department queue depth.
///
/// The estimate is a static product of depth and the department's average
/// consultation time; it is computed once at intake and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTimeEstimator {
    consultation_minutes: BTreeMap<Department, u32>,
    fallback_minutes: u32,
}

impl Default for WaitTimeEstimator {
    fn default() -> Self {
        WaitTimeEstimator {
            consultation_minutes: DEFAULT_CONSULTATION_MINUTES.into_iter().collect(),
            fallback_minutes: FALLBACK_CONSULTATION_MINUTES,
        }
    }
}

impl WaitTimeEstimator {
    pub fn new(consultation_minutes: BTreeMap<Department, u32>, fallback_minutes: u32) -> Self {
        WaitTimeEstimator {
            consultation_minutes,
            fallback_minutes,
        }
    }

    pub fn consultation_minutes(&self, department: Department) -> u32 {
        self.consultation_minutes
            .get(&department)
            .copied()
            .unwrap_or(self.fallback_minutes)
    }

    pub fn estimate(&self, queue_depth: usize, department: Department) -> u32 {
        (queue_depth as u32).saturating_mul(self.consultation_minutes(department))
    }

    /// Estimate for a free-form department name; unrecognized names use the
    /// fallback rate.
    pub fn estimate_by_name(&self, queue_depth: usize, department: &str) -> u32 {
        let minutes = Department::from_string(department)
            .map(|d| self.consultation_minutes(d))
            .unwrap_or(self.fallback_minutes);
        (queue_depth as u32).saturating_mul(minutes)
    }
}
