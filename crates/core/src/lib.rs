//! # Genomics Core
//!
//! Core business logic for the genomics patient record system.
//!
//! This crate contains pure data operations and file management:
//! - Patient records stored one JSON file per patient, with soft delete
//! - FASTA sequence reading and sequence file checksums
//! - Disease marker matching against a corpus directory
//! - Plain-text analysis reports
//!
//! **No transport concerns**: TLS, framing and sockets belong in `genomics-channel`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod fasta;
pub mod matcher;
pub mod patient;
pub mod repositories;
pub mod results;

pub use analysis::AnalysisService;
pub use config::{CoreConfig, NetworkSettings};
pub use error::{ConfigError, PatientError, PatientResult};
pub use fasta::{describe_sequence_file, read_sequence, SequenceFileInfo};
pub use matcher::{analyze, load_corpus, DiseaseRecord};
pub use patient::{Patient, PatientId, Sex};
pub use repositories::patients::PatientRepository;
pub use results::ResultStore;
