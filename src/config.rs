//! Configuration for the clinic intake engine.
//!
//! Every field has a default, so an empty TOML file yields the stock clinic:
//! five departments, the standard symptom weights and the sample roster.

use crate::error::{ClinicError, Result};
use crate::models::{Department, NewDoctor, Symptom, MAX_WEIGHT, MIN_WEIGHT};
use crate::triage::{
    SymptomCatalog, WaitTimeEstimator, DEFAULT_CONSULTATION_MINUTES, DEFAULT_SYMPTOM_WEIGHTS,
    FALLBACK_CONSULTATION_MINUTES,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Environment variable naming a config file for the binary.
pub const CONFIG_ENV_VAR: &str = "CLINICQUEUE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Average consultation minutes keyed by department name
    #[serde(default = "default_consultation_minutes")]
    pub consultation_minutes: BTreeMap<String, u32>,

    /// Minutes used for departments missing from the table
    #[serde(default = "default_fallback_minutes")]
    pub fallback_consultation_minutes: u32,

    /// Seed symptom catalog (name -> weight 1-10)
    #[serde(default = "default_symptoms")]
    pub symptoms: BTreeMap<String, u8>,

    /// Seed doctor roster
    #[serde(default = "default_doctors")]
    pub doctors: Vec<DoctorSeed>,

    /// tracing filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSeed {
    pub name: String,
    pub department: String,
    pub specialization: String,
    pub max_patients_per_hour: u32,
}

fn default_consultation_minutes() -> BTreeMap<String, u32> {
    DEFAULT_CONSULTATION_MINUTES
        .iter()
        .map(|(department, minutes)| (department.name().to_string(), *minutes))
        .collect()
}

fn default_fallback_minutes() -> u32 {
    FALLBACK_CONSULTATION_MINUTES
}

fn default_symptoms() -> BTreeMap<String, u8> {
    DEFAULT_SYMPTOM_WEIGHTS
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

fn default_doctors() -> Vec<DoctorSeed> {
    [
        ("John Smith", "General", "Family Medicine", 4),
        ("Sarah Johnson", "Cardiology", "Cardiologist", 3),
        ("Michael Chen", "Neurology", "Neurologist", 3),
        ("Emily Brown", "Orthopedics", "Orthopedic Surgeon", 2),
        ("David Wilson", "Pediatrics", "Pediatrician", 4),
    ]
    .into_iter()
    .map(|(name, department, specialization, cap)| DoctorSeed {
        name: name.into(),
        department: department.into(),
        specialization: specialization.into(),
        max_patients_per_hour: cap,
    })
    .collect()
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            consultation_minutes: default_consultation_minutes(),
            fallback_consultation_minutes: default_fallback_minutes(),
            symptoms: default_symptoms(),
            doctors: default_doctors(),
            log_filter: default_log_filter(),
        }
    }
}

impl ClinicConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading clinic configuration");

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.wait_time_estimator()?;
        self.symptom_catalog()?;
        self.new_doctors()?;
        Ok(())
    }

    pub fn wait_time_estimator(&self) -> Result<WaitTimeEstimator> {
        if self.fallback_consultation_minutes == 0 {
            return Err(ClinicError::Config(
                "fallback_consultation_minutes must be positive".into(),
            ));
        }

        let mut table = BTreeMap::new();
        for (name, minutes) in &self.consultation_minutes {
            let department = Department::from_string(name)
                .map_err(|e| ClinicError::Config(e.to_string()))?;
            if *minutes == 0 {
                return Err(ClinicError::Config(format!(
                    "Consultation minutes for {} must be positive",
                    department
                )));
            }
            table.insert(department, *minutes);
        }

        Ok(WaitTimeEstimator::new(table, self.fallback_consultation_minutes))
    }

    pub fn symptom_catalog(&self) -> Result<SymptomCatalog> {
        let mut catalog = SymptomCatalog::new();
        for (name, weight) in &self.symptoms {
            if *weight < MIN_WEIGHT || *weight > MAX_WEIGHT {
                return Err(ClinicError::Config(format!(
                    "Symptom '{}' has weight {}; weights must be {}-{}",
                    name, weight, MIN_WEIGHT, MAX_WEIGHT
                )));
            }
            let symptom = Symptom::new(name, *weight as i64)
                .map_err(|e| ClinicError::Config(e.to_string()))?;
            catalog
                .insert(symptom)
                .map_err(|e| ClinicError::Config(e.to_string()))?;
        }
        Ok(catalog)
    }

    pub fn new_doctors(&self) -> Result<Vec<NewDoctor>> {
        self.doctors
            .iter()
            .map(|seed| {
                NewDoctor::new(
                    &seed.name,
                    &seed.department,
                    &seed.specialization,
                    seed.max_patients_per_hour as i64,
                )
                .map_err(|e| ClinicError::Config(format!("Doctor '{}': {}", seed.name, e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClinicConfig::default();
        config.validate().unwrap();
        assert_eq!(config.doctors.len(), 5);
        assert_eq!(config.symptom_catalog().unwrap().weight_of("chest pain"), 9);
        assert_eq!(
            config.wait_time_estimator().unwrap(),
            WaitTimeEstimator::default()
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let config = ClinicConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.fallback_consultation_minutes, 15);
        assert_eq!(config.symptoms.len(), DEFAULT_SYMPTOM_WEIGHTS.len());
    }

    #[test]
    fn test_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
log_filter = "debug"
fallback_consultation_minutes = 20

[consultation_minutes]
General = 12

[symptoms]
"chest pain" = 10
rash = 2

[[doctors]]
name = "Dr. Ada Park"
department = "Pediatrics"
specialization = "Pediatrician"
max_patients_per_hour = 5
"#
        )
        .unwrap();

        let config = ClinicConfig::from_file(file.path()).unwrap();
        let estimator = config.wait_time_estimator().unwrap();
        assert_eq!(estimator.estimate(2, Department::General), 24);
        // Departments dropped from the table use the fallback.
        assert_eq!(estimator.estimate(2, Department::Neurology), 40);

        let catalog = config.symptom_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.weight_of("Chest Pain"), 10);

        let doctors = config.new_doctors().unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].name, "Ada Park");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ClinicConfig::default();
        config.symptoms.insert("rash".into(), 11);
        assert!(matches!(config.validate(), Err(ClinicError::Config(_))));

        let mut config = ClinicConfig::default();
        config.consultation_minutes.insert("Dermatology".into(), 10);
        assert!(matches!(config.validate(), Err(ClinicError::Config(_))));

        let mut config = ClinicConfig::default();
        config.doctors[0].max_patients_per_hour = 0;
        assert!(matches!(config.validate(), Err(ClinicError::Config(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "symptoms = [1, 2").unwrap();
        assert!(matches!(
            ClinicConfig::from_file(file.path()),
            Err(ClinicError::Toml(_))
        ));
    }
}
