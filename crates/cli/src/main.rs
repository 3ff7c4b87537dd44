use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genomics_certificates::IdentityBundle;
use genomics_channel::{SecureClient, TlsIdentity};
use genomics_core::constants::ENV_CERT_PASSWORD;
use genomics_core::{
    describe_sequence_file, ConfigError, CoreConfig, NetworkSettings, Patient, PatientError,
    PatientId, PatientRepository, PatientResult, Sex,
};

#[derive(Parser)]
#[command(name = "genomics")]
#[command(about = "Genomics patient record system CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new patient
    Create {
        /// Patient identifier
        #[arg(long)]
        id: PatientId,
        /// Full name
        #[arg(long)]
        name: String,
        /// Identity document number
        #[arg(long)]
        document: String,
        /// Contact email
        #[arg(long)]
        email: String,
        #[arg(long)]
        age: u32,
        /// M or F
        #[arg(long)]
        sex: Sex,
        /// FASTA file holding the patient's sequence
        #[arg(long)]
        sequence_file: PathBuf,
    },
    /// Show a patient record
    Read {
        /// Patient identifier
        id: PatientId,
    },
    /// Change fields of an existing patient
    Update {
        /// Patient identifier
        id: PatientId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        sex: Option<Sex>,
        /// New FASTA file; the checksum and size are recomputed
        #[arg(long)]
        sequence_file: Option<PathBuf>,
    },
    /// Deactivate a patient (the record is kept)
    Delete {
        /// Patient identifier
        id: PatientId,
    },
    /// List active patients
    List,
    /// Send a patient to the analysis server and print its reply
    Submit {
        /// Patient identifier
        id: PatientId,
    },
    /// Generate the shared PKCS#12 bundle used by client and server
    GenerateBundle {
        /// Output path for the bundle
        #[arg(long)]
        out: PathBuf,
        /// Certificate common name
        #[arg(long, default_value = "genomics")]
        common_name: String,
        /// Subject alternative names (repeatable)
        #[arg(long = "host", default_values_t = vec!["localhost".to_string(), "127.0.0.1".to_string()])]
        hosts: Vec<String>,
    },
}

/// Field changes requested by `update`. `None` leaves a field as it is.
#[derive(Debug, Default)]
struct PatientChanges {
    name: Option<String>,
    document: Option<String>,
    email: Option<String>,
    age: Option<u32>,
    sex: Option<Sex>,
    sequence_file: Option<PathBuf>,
}

impl PatientChanges {
    fn apply(self, patient: &mut Patient) -> PatientResult<()> {
        if let Some(path) = self.sequence_file {
            let info = describe_sequence_file(&path)?;
            patient.sequence_file = path.display().to_string();
            patient.checksum = info.checksum;
            patient.file_size_bytes = info.size_bytes;
        }
        if let Some(name) = self.name {
            patient.full_name = name;
        }
        if let Some(document) = self.document {
            patient.document_id = document;
        }
        if let Some(email) = self.email {
            patient.contact_email = email;
        }
        if let Some(age) = self.age {
            patient.age = age;
        }
        if let Some(sex) = self.sex {
            patient.sex = sex;
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn new_patient(
    id: PatientId,
    name: String,
    document: String,
    email: String,
    age: u32,
    sex: Sex,
    sequence_file: &Path,
) -> PatientResult<Patient> {
    let info = describe_sequence_file(sequence_file)?;
    Ok(Patient {
        id,
        full_name: name,
        document_id: document,
        contact_email: email,
        registration_date: Utc::now(),
        age,
        sex,
        sequence_file: sequence_file.display().to_string(),
        checksum: info.checksum,
        file_size_bytes: info.size_bytes,
        active: true,
    })
}

fn print_patient(patient: &Patient) {
    println!("ID: {}", patient.id);
    println!("Name: {}", patient.full_name);
    println!("Document: {}", patient.document_id);
    println!("Email: {}", patient.contact_email);
    println!("Registered: {}", patient.registration_date.to_rfc3339());
    println!("Age: {}", patient.age);
    println!("Sex: {}", patient.sex);
    println!("Sequence file: {}", patient.sequence_file);
    println!("Checksum: {}", patient.checksum);
    println!("Size: {} bytes", patient.file_size_bytes);
    println!("Active: {}", patient.active);
}

/// Loads network settings first so a misconfigured client fails before touching storage.
fn submit(repo: &PatientRepository, id: &PatientId) -> anyhow::Result<String> {
    let settings = NetworkSettings::from_env()?;
    submit_with(&settings, repo, id)
}

fn submit_with(
    settings: &NetworkSettings,
    repo: &PatientRepository,
    id: &PatientId,
) -> anyhow::Result<String> {
    let identity = TlsIdentity::from_pkcs12_file(&settings.cert_path, &settings.cert_password)?;
    let client = SecureClient::new(&identity, settings.host.as_str(), settings.port)?;

    let patient = repo
        .read(id)?
        .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

    tracing::info!(patient_id = %id, "submitting to {}:{}", settings.host, settings.port);
    let reply = client.exchange(&patient.to_json()?)?;
    tracing::info!(patient_id = %id, "analysis server replied");
    Ok(reply)
}

fn generate_bundle(out: &Path, common_name: &str, hosts: &[String]) -> anyhow::Result<()> {
    let password = std::env::var(ENV_CERT_PASSWORD)
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or(ConfigError::MissingVar(ENV_CERT_PASSWORD))?;
    IdentityBundle::generate(common_name, hosts, &password)?.write_to(out)?;
    tracing::info!(path = %out.display(), "certificate bundle written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("genomics_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let repo = PatientRepository::new(Arc::new(CoreConfig::from_env()));

    match cli.command {
        Some(Commands::Create {
            id,
            name,
            document,
            email,
            age,
            sex,
            sequence_file,
        }) => match new_patient(id, name, document, email, age, sex, &sequence_file)
            .and_then(|patient| repo.create(&patient).map(|path| (patient, path)))
        {
            Ok((patient, path)) => {
                println!("Created patient {} at {}", patient.id, path.display())
            }
            Err(e) => eprintln!("Error creating patient: {}", e),
        },
        Some(Commands::Read { id }) => match repo.read(&id) {
            Ok(Some(patient)) => print_patient(&patient),
            Ok(None) => println!("No patient found with ID: {}", id),
            Err(e) => eprintln!("Error reading patient: {}", e),
        },
        Some(Commands::Update {
            id,
            name,
            document,
            email,
            age,
            sex,
            sequence_file,
        }) => {
            let changes = PatientChanges {
                name,
                document,
                email,
                age,
                sex,
                sequence_file,
            };
            let outcome = repo.read(&id).and_then(|found| {
                let mut patient = found.ok_or_else(|| PatientError::NotFound(id.to_string()))?;
                changes.apply(&mut patient)?;
                repo.update(&patient)
            });
            match outcome {
                Ok(()) => println!("Updated patient {}", id),
                Err(e) => eprintln!("Error updating patient: {}", e),
            }
        }
        Some(Commands::Delete { id }) => match repo.delete(&id) {
            Ok(()) => println!("Deactivated patient {}", id),
            Err(e) => eprintln!("Error deleting patient: {}", e),
        },
        Some(Commands::List) => match repo.list_active() {
            Ok(patients) if patients.is_empty() => println!("No active patients."),
            Ok(patients) => {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, Age: {}, Registered: {}",
                        patient.id,
                        patient.full_name,
                        patient.age,
                        patient.registration_date.to_rfc3339()
                    );
                }
            }
            Err(e) => eprintln!("Error listing patients: {}", e),
        },
        Some(Commands::Submit { id }) => match submit(&repo, &id) {
            Ok(reply) => println!("Response: {}", reply),
            Err(e) => eprintln!("Error submitting patient: {}", e),
        },
        Some(Commands::GenerateBundle {
            out,
            common_name,
            hosts,
        }) => match generate_bundle(&out, &common_name, &hosts) {
            Ok(()) => println!("Wrote certificate bundle to {}", out.display()),
            Err(e) => eprintln!("Error generating bundle: {}", e),
        },
        None => {
            println!("Use 'genomics --help' for commands");
        }
    }

    Ok(())
}
