/// Command-line interface for the clinic intake system.
///
/// This module provides an interactive CLI for registering patients,
/// watching department queues, moving tokens through their lifecycle and
/// managing the doctor roster and symptom catalog.

use clinicqueue::config::CONFIG_ENV_VAR;
use clinicqueue::{
    create_intake_request, ClinicConfig, Department, InMemoryStore, IntakeService, NewDoctor,
    SystemClock, Token, TokenStatus,
};
use std::cell::Cell;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct IntakeCLI {
    config: ClinicConfig,
    service: IntakeService<InMemoryStore>,
    running: bool,
    stdin_closed: Cell<bool>,
}

impl IntakeCLI {
    fn new(config: ClinicConfig) -> clinicqueue::Result<Self> {
        let service = build_service(&config)?;
        Ok(IntakeCLI {
            config,
            service,
            running: true,
            stdin_closed: Cell::new(false),
        })
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("        CLINIC INTAKE & TRIAGE QUEUE");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        println!("\n--- Main Menu ---");
        println!("1. Register patient");
        println!("2. View department queue");
        println!("3. Update token status");
        println!("4. View doctors");
        println!("5. Toggle doctor availability");
        println!("6. Add doctor");
        println!("7. View symptoms");
        println!("8. Add symptom");
        println!("9. Queue statistics");
        println!("10. Export tokens as JSON");
        println!("11. Run demo");
        println!("12. Exit");
        println!("{}", "-".repeat(20));
    }

    fn get_input(&self, prompt: &str, default: Option<&str>) -> String {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => self.stdin_closed.set(true),
            Ok(_) => {}
        }
        let input = input.trim();

        if input.is_empty() {
            default.unwrap_or("").to_string()
        } else {
            input.to_string()
        }
    }

    fn get_int_input(&self, prompt: &str, default: Option<i64>) -> i64 {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref());

            if let Ok(value) = input.parse::<i64>() {
                return value;
            }
            if self.stdin_closed.get() {
                return default.unwrap_or(0);
            }
            println!("Please enter a valid number");
        }
    }

    fn choose_department(&self) -> Option<Department> {
        println!("\nDepartments:");
        for (i, department) in Department::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, department);
        }
        let choice = self.get_int_input("Select department", Some(1));
        if choice >= 1 && (choice as usize) <= Department::ALL.len() {
            Some(Department::ALL[choice as usize - 1])
        } else {
            println!("Invalid department");
            None
        }
    }

    fn register_patient(&mut self) {
        println!("\n--- Register Patient ---");

        let name = self.get_input("Patient name", None);
        let age = self.get_int_input("Age", Some(30));
        let gender = self.get_input("Gender (Male/Female/Other)", Some("Other"));
        let department = match self.choose_department() {
            Some(d) => d,
            None => return,
        };
        let symptoms = self.get_input("Symptoms (comma separated)", None);
        let symptoms: Vec<&str> = symptoms.split(',').collect();

        let doctors = self.service.list_doctors();
        println!("\nPreferred doctor:");
        println!("  0. No preference");
        for (i, doctor) in doctors.iter().enumerate() {
            println!(
                "  {}. {} ({}){}",
                i + 1,
                doctor.display_name(),
                doctor.department,
                if doctor.is_available { "" } else { " - unavailable" }
            );
        }
        let choice = self.get_int_input("Select doctor", Some(0));
        let preferred = if choice >= 1 && (choice as usize) <= doctors.len() {
            Some(doctors[choice as usize - 1].display_name())
        } else {
            None
        };

        let request = create_intake_request(
            &name,
            age,
            &gender,
            department.name(),
            &symptoms,
            preferred.as_deref(),
        );

        match request.and_then(|r| self.service.register(r)) {
            Ok(receipt) => {
                let token = &receipt.token;
                println!("\nToken issued: {}", token.token);
                println!("  Triage: {} (score {})", token.urgency_tier, token.triage_score);
                println!(
                    "  Estimated wait: {} minutes ({} ahead in {})",
                    token.estimated_wait_minutes, receipt.queue_depth, token.department
                );
                match &token.doctor {
                    Some(doctor) => println!("  Doctor: Dr. {}", doctor.name),
                    None if receipt.assignment.is_fallback() => {
                        println!("  Preferred doctor unavailable; joined the general queue")
                    }
                    None => println!("  Doctor: next available"),
                }
            }
            Err(e) => println!("Error registering patient: {}", e),
        }
    }

    fn print_token_line(token: &Token) {
        println!(
            "  {} {:20} [{:8}] score {:2}  wait ~{} min{}",
            token.token,
            token.patient_name,
            token.urgency_tier.name(),
            token.triage_score,
            token.estimated_wait_minutes,
            token
                .doctor
                .as_ref()
                .map(|d| format!("  (Dr. {})", d.name))
                .unwrap_or_default()
        );
    }

    fn view_queue(&self) {
        let department = match self.choose_department() {
            Some(d) => d,
            None => return,
        };
        let board = self.service.department_board(department);

        println!("\n--- {} Queue ---", department);
        println!("\nWaiting ({}):", board.waiting.len());
        for token in &board.waiting {
            Self::print_token_line(token);
        }
        println!("\nIn progress ({}):", board.in_progress.len());
        for token in &board.in_progress {
            Self::print_token_line(token);
        }
        println!("\nCompleted ({}):", board.completed.len());
        for token in &board.completed {
            Self::print_token_line(token);
        }
    }

    fn update_status(&mut self) {
        println!("\n--- Update Token Status ---");
        let token = self.get_input("Token number (e.g. #J0001)", None);
        let status = self.get_input("New status (waiting/in-progress/completed)", Some("in-progress"));

        match TokenStatus::from_string(&status).and_then(|s| self.service.update_status(&token, s)) {
            Ok(updated) => println!("\n{} is now {}", updated.token, updated.status),
            Err(e) => println!("Error updating status: {}", e),
        }
    }

    fn view_doctors(&self) {
        let doctors = self.service.list_doctors();
        if doctors.is_empty() {
            println!("\nNo doctors on the roster");
            return;
        }

        println!("\n--- Doctors ({}) ---", doctors.len());
        for (i, doctor) in doctors.iter().enumerate() {
            println!(
                "  {}. {:20} {:12} {:20} queue {:2}  preferred today {:2}  {}",
                i + 1,
                doctor.display_name(),
                doctor.department.name(),
                doctor.specialization,
                doctor.current_queue_length,
                doctor.preference_count_today,
                if doctor.is_available { "available" } else { "unavailable" }
            );
        }
    }

    fn toggle_availability(&mut self) {
        self.view_doctors();
        let doctors = self.service.list_doctors();
        if doctors.is_empty() {
            return;
        }

        let choice = self.get_int_input("Select doctor to toggle (0 to go back)", Some(0));
        if choice < 1 || (choice as usize) > doctors.len() {
            return;
        }

        let doctor = &doctors[choice as usize - 1];
        match self
            .service
            .set_doctor_availability(doctor.id, !doctor.is_available)
        {
            Ok(updated) => println!(
                "\n{} is now {}",
                updated.display_name(),
                if updated.is_available { "available" } else { "unavailable" }
            ),
            Err(e) => println!("Error updating doctor: {}", e),
        }
    }

    fn add_doctor(&mut self) {
        println!("\n--- Add Doctor ---");
        let name = self.get_input("Doctor name", None);
        let department = match self.choose_department() {
            Some(d) => d,
            None => return,
        };
        let specialization = self.get_input("Specialization", None);
        let cap = self.get_int_input("Max patients per hour (1-10)", Some(4));

        match NewDoctor::new(&name, department.name(), &specialization, cap)
            .and_then(|d| self.service.add_doctor(d))
        {
            Ok(doctor) => println!("\nAdded {} to {}", doctor.display_name(), doctor.department),
            Err(e) => println!("Error adding doctor: {}", e),
        }
    }

    fn view_symptoms(&self) {
        let symptoms = self.service.list_symptoms();
        println!("\n--- Symptom Catalog ({}) ---", symptoms.len());
        for symptom in symptoms {
            println!("  {:2}  {}", symptom.weight, symptom.name);
        }
    }

    fn add_symptom(&mut self) {
        println!("\n--- Add Symptom ---");
        let name = self.get_input("Symptom name", None);
        let weight = self.get_int_input("Triage weight (1-10)", Some(1));

        match self.service.add_symptom(&name, weight) {
            Ok(symptom) => println!("\nAdded '{}' with weight {}", symptom.name, symptom.weight),
            Err(e) => println!("Error adding symptom: {}", e),
        }
    }

    fn queue_statistics(&self) {
        let sizes = self.service.queue_sizes();
        println!("\n--- Queue Statistics ---");
        if sizes.is_empty() {
            println!("  Nobody is waiting");
            return;
        }
        for (department, count) in sizes {
            println!(
                "  {:12} {:3} waiting  (~{} min for the next arrival)",
                department.name(),
                count,
                self.service.estimator().estimate(count, department)
            );
        }
    }

    fn export_tokens(&self) {
        match self.service.export_tokens_json() {
            Ok(json) => println!("{}", json),
            Err(e) => println!("Error exporting tokens: {}", e),
        }
    }

    fn run_demo(&mut self) {
        println!("\n--- Running Demo ---");

        let service = match build_service(&self.config) {
            Ok(service) => service,
            Err(e) => {
                println!("Error setting up demo: {}", e);
                return;
            }
        };

        if let Some(chen) = service
            .list_doctors()
            .into_iter()
            .find(|d| d.name == "Michael Chen")
        {
            match service.set_doctor_availability(chen.id, false) {
                Ok(updated) => println!("{} is marked unavailable", updated.display_name()),
                Err(e) => println!("Error updating doctor: {}", e),
            }
        }

        let patients: [(&str, i64, &str, &str, &[&str], Option<&str>); 5] = [
            ("John Smith", 34, "Male", "General", &["cough", "sore throat"], None),
            ("Jane Doe", 61, "Female", "Cardiology", &["chest pain"], None),
            ("Bob Wilson", 45, "Male", "Cardiology", &["cough", "chest pain"], Some("Dr. Sarah Johnson")),
            ("Alice Brown", 29, "Female", "Neurology", &["fever", "stiff neck"], Some("Dr. Michael Chen")),
            ("Tom Green", 8, "Male", "Cardiology", &["headache"], None),
        ];

        for (name, age, gender, department, symptoms, doctor) in patients {
            let receipt = create_intake_request(name, age, gender, department, symptoms, doctor)
                .and_then(|r| service.register(r));
            match receipt {
                Ok(receipt) => println!(
                    "  {} {:12} -> {:8} score {:2}, wait {:2} min{}",
                    receipt.token.token,
                    name,
                    receipt.token.urgency_tier.name(),
                    receipt.token.triage_score,
                    receipt.token.estimated_wait_minutes,
                    match (&receipt.token.doctor, receipt.assignment.is_fallback()) {
                        (Some(d), _) => format!(", Dr. {}", d.name),
                        (None, true) => ", preferred doctor unavailable".to_string(),
                        (None, false) => String::new(),
                    }
                ),
                Err(e) => println!("  {}: {}", name, e),
            }
        }

        println!("\nCardiology service order:");
        for token in &service.department_board(Department::Cardiology).waiting {
            Self::print_token_line(token);
        }

        println!("\nNote: Jane Doe (chest pain, 9) is called before Bob Wilson,");
        println!("whose cough + chest pain combination scores 8.");

        self.service = service;
    }

    fn run(&mut self) {
        self.print_header();

        while self.running {
            self.print_menu();

            let choice = self.get_int_input("Enter choice", Some(11));
            if self.stdin_closed.get() {
                self.running = false;
                break;
            }

            match choice {
                1 => self.register_patient(),
                2 => self.view_queue(),
                3 => self.update_status(),
                4 => self.view_doctors(),
                5 => self.toggle_availability(),
                6 => self.add_doctor(),
                7 => self.view_symptoms(),
                8 => self.add_symptom(),
                9 => self.queue_statistics(),
                10 => self.export_tokens(),
                11 => self.run_demo(),
                12 => {
                    self.running = false;
                    println!("\nGoodbye!");
                }
                _ => println!("Invalid choice"),
            }
        }
    }
}

fn build_service(config: &ClinicConfig) -> clinicqueue::Result<IntakeService<InMemoryStore>> {
    let store = Arc::new(InMemoryStore::seeded(config, Arc::new(SystemClock))?);
    Ok(IntakeService::new(store, config.wait_time_estimator()?))
}

fn load_config() -> clinicqueue::Result<ClinicConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok());

    match path {
        Some(path) => ClinicConfig::from_file(path),
        None => Ok(ClinicConfig::default()),
    }
}

fn main() -> clinicqueue::Result<()> {
    let config = load_config()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut cli = match IntakeCLI::new(config) {
        Ok(cli) => cli,
        Err(e) => {
            error!(error = %e, "Failed to start intake system");
            return Err(e);
        }
    };
    cli.run();
    Ok(())
}
