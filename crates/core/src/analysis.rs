//! Server-side analysis of submitted patients.
//!
//! [`AnalysisService::respond`] turns one request payload into one reply status. It never
//! fails: any problem with the payload or the analysis becomes the generic error reply, so a
//! bad submission cannot take the server down.

use crate::config::CoreConfig;
use crate::constants::{FASTA_EXTENSION, GENERIC_ERROR_REPLY, GENOME_FILE_PREFIX};
use crate::fasta::read_sequence;
use crate::matcher::{analyze, load_corpus};
use crate::patient::{Patient, PatientId};
use crate::results::{detected_summary, ResultStore};
use crate::PatientResult;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AnalysisService {
    cfg: Arc<CoreConfig>,
    results: ResultStore,
}

impl AnalysisService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let results = ResultStore::new(cfg.results_dir());
        Self { cfg, results }
    }

    /// Server-side location of the sequence for `id`.
    ///
    /// The client's `sequence_file` path is not used for reading; it only appears in the
    /// report.
    pub fn genome_path(&self, id: &PatientId) -> PathBuf {
        self.cfg.genomes_dir().join(format!(
            "{}{}.{}",
            GENOME_FILE_PREFIX, id, FASTA_EXTENSION
        ))
    }

    /// Screens `patient` against the current corpus and persists the report.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if the sequence or corpus cannot be read, or the report cannot
    /// be written.
    pub fn process(&self, patient: &Patient) -> PatientResult<Vec<String>> {
        let sequence = read_sequence(&self.genome_path(&patient.id))?;
        let corpus = load_corpus(&self.cfg.diseases_dir())?;

        let detected = analyze(&sequence, &corpus);
        self.results.persist(patient, &detected)?;

        Ok(detected)
    }

    /// Handles one request payload and returns the reply text.
    pub fn respond(&self, payload: &str) -> String {
        let patient = match Patient::from_json(payload) {
            Ok(patient) => patient,
            Err(e) => {
                tracing::warn!("rejecting submission: {}", e);
                return GENERIC_ERROR_REPLY.to_string();
            }
        };

        tracing::info!(patient_id = %patient.id, "processing patient");
        match self.process(&patient) {
            Ok(detected) => {
                let summary = detected_summary(&detected);
                tracing::info!(patient_id = %patient.id, detected = %summary, "analysis complete");
                success_reply(&patient, &summary)
            }
            Err(e) => {
                tracing::error!(patient_id = %patient.id, "analysis failed: {}", e);
                GENERIC_ERROR_REPLY.to_string()
            }
        }
    }
}

fn success_reply(patient: &Patient, summary: &str) -> String {
    format!(
        "Patient {} processed. Detected diseases: {}",
        patient.full_name, summary
    )
}
