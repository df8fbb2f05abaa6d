use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use citycare_core::{CityCare, Consent, CoreConfig, PatientPatch, PatientRecord};
use api_shared::HealthService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "citycare")]
#[command(about = "CityCare patient record store CLI")]
struct Cli {
    /// Data directory (overrides CITYCARE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Show one patient as JSON
    Show {
        /// Patient identifier
        user_id: String,
    },
    /// Register a patient, or reset the PIN of an existing one
    Register {
        user_id: String,
        pin: String,
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        facility: Option<String>,
    },
    /// Update dashboard fields of a patient
    Update {
        user_id: String,
        pin: String,
        #[command(flatten)]
        fields: PatchArgs,
    },
    /// Print collection sizes
    Health,
}

#[derive(Args, Default)]
struct PatchArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    height_cm: Option<f64>,
    #[arg(long)]
    weight_kg: Option<f64>,
    #[arg(long)]
    bmi: Option<f64>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    emergency_contact: Option<String>,
    #[arg(long)]
    conditions: Option<String>,
    #[arg(long)]
    allergies: Option<String>,
    #[arg(long)]
    meds: Option<String>,
    /// none, all, doctors or custom
    #[arg(long)]
    consent: Option<String>,
    /// Comma-separated identifiers
    #[arg(long)]
    share_with: Option<String>,
    #[arg(long)]
    doctor: Option<String>,
    #[arg(long)]
    facility: Option<String>,
}

impl PatchArgs {
    fn into_patch(self) -> anyhow::Result<PatientPatch> {
        let consent = self
            .consent
            .map(|c| parse_consent(&c))
            .transpose()?;
        let share_with = self.share_with.map(|s| {
            s.split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect()
        });

        Ok(PatientPatch {
            name: self.name,
            age: self.age,
            gender: self.gender,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            bmi: self.bmi,
            phone: self.phone,
            email: self.email,
            emergency_contact: self.emergency_contact,
            conditions: self.conditions,
            allergies: self.allergies,
            meds: self.meds,
            consent,
            share_with,
            assigned_doctor_id: self.doctor,
            facility_id: self.facility,
        })
    }
}

fn parse_consent(value: &str) -> anyhow::Result<Consent> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .with_context(|| format!("unknown consent value: {value}"))
}

fn summary_line(patient: &PatientRecord) -> String {
    format!(
        "ID: {}, Name: {}, Doctor: {}, Updated: {}",
        patient.user_id,
        patient.name.as_deref().unwrap_or("-"),
        patient.assigned_doctor_id.as_deref().unwrap_or("-"),
        patient.updated_at
    )
}

/// `RUST_LOG` if it parses, otherwise warnings and errors only.
fn log_filter(spec: Option<String>) -> EnvFilter {
    spec.and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'citycare --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_values(
        cli.data_dir.or_else(|| std::env::var("CITYCARE_DATA_DIR").ok()),
        std::env::var("CITYCARE_DOCTOR_PIN").ok(),
        None,
    )?;
    let app = CityCare::open(Arc::new(cfg))?;

    match command {
        Commands::List => {
            let patients = app.patients().list()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in &patients {
                    println!("{}", summary_line(patient));
                }
            }
        }
        Commands::Show { user_id } => {
            let patient = app.patients().get(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&patient)?);
        }
        Commands::Register {
            user_id,
            pin,
            doctor,
            facility,
        } => {
            let reg = app.patients().register(&user_id, &pin, doctor, facility)?;
            if reg.created {
                println!("Registered patient {}", reg.record.user_id);
            } else {
                println!("Patient {} already existed; PIN reset", reg.record.user_id);
            }
        }
        Commands::Update {
            user_id,
            pin,
            fields,
        } => {
            let outcome = app.patients().update(&user_id, &pin, fields.into_patch()?)?;
            if outcome.changed {
                println!("Updated patient {}", user_id);
            } else {
                println!("No changes for patient {}", user_id);
            }
        }
        Commands::Health => {
            let res = HealthService::check_health(app.counts()?);
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
    }

    Ok(())
}
