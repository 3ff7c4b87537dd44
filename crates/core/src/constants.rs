//! Constants used throughout the genomics core crate.
//!
//! This module contains all path, filename and environment variable constants to ensure
//! consistency across the codebase.

/// Default root directory for all data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Directory name for patient record storage.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for analysis reports.
pub const RESULTS_DIR_NAME: &str = "results";

/// Directory name for server-side patient sequences.
pub const GENOMES_DIR_NAME: &str = "genomes";

/// Directory name for the disease marker corpus.
pub const DISEASES_DIR_NAME: &str = "diseases";

/// Prefix of patient record files (`patient_<id>.json`).
pub const PATIENT_FILE_PREFIX: &str = "patient_";

/// Extension of patient record files.
pub const PATIENT_FILE_EXTENSION: &str = "json";

/// Suffix of analysis report files (`patient_<id>_results.txt`).
pub const REPORT_FILE_SUFFIX: &str = "_results.txt";

/// Prefix of server-side sequence files (`patient<id>.fasta`).
pub const GENOME_FILE_PREFIX: &str = "patient";

/// Extension of FASTA files.
pub const FASTA_EXTENSION: &str = "fasta";

/// Sentinel written when no disease marker matched.
pub const NONE_DETECTED: &str = "None detected";

/// Reply sent when a submission could not be processed.
pub const GENERIC_ERROR_REPLY: &str = "Error processing patient.";

/// Maximum length of a patient id.
pub const MAX_PATIENT_ID_LEN: usize = 64;

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 4040;

pub const ENV_CERT_PATH: &str = "GENOMICS_CERT_PATH";
pub const ENV_CERT_PASSWORD: &str = "GENOMICS_CERT_PASSWORD";
pub const ENV_SERVER_HOST: &str = "GENOMICS_SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "GENOMICS_SERVER_PORT";
pub const ENV_DATA_DIR: &str = "GENOMICS_DATA_DIR";
