//! Analysis report persistence.
//!
//! One plain-text report per patient, `patient_<id>_results.txt`, overwritten on every
//! analysis. There is no read API; reports are for humans.

use crate::constants::{NONE_DETECTED, PATIENT_FILE_PREFIX, REPORT_FILE_SUFFIX};
use crate::patient::{Patient, PatientId};
use crate::{PatientError, PatientResult};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: PathBuf) -> Self {
        Self { results_dir }
    }

    pub fn report_path(&self, id: &PatientId) -> PathBuf {
        self.results_dir
            .join(format!("{}{}{}", PATIENT_FILE_PREFIX, id, REPORT_FILE_SUFFIX))
    }

    /// Writes the report for `patient`, creating the results directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::ResultsDirCreation` or `PatientError::ReportWrite` on
    /// filesystem failure.
    pub fn persist(&self, patient: &Patient, detected: &[String]) -> PatientResult<PathBuf> {
        fs::create_dir_all(&self.results_dir).map_err(PatientError::ResultsDirCreation)?;

        let path = self.report_path(&patient.id);
        fs::write(&path, render_report(patient, detected)).map_err(PatientError::ReportWrite)?;

        tracing::info!(patient_id = %patient.id, path = %path.display(), "analysis report written");
        Ok(path)
    }
}

/// Comma-joined disease names, or the "none detected" sentinel.
pub fn detected_summary(detected: &[String]) -> String {
    if detected.is_empty() {
        NONE_DETECTED.to_string()
    } else {
        detected.join(", ")
    }
}

pub fn render_report(patient: &Patient, detected: &[String]) -> String {
    format!(
        "Patient ID: {}\nFull name: {}\nDocument ID: {}\nAge: {}\nSequence file: {}\nDetected diseases: {}\n",
        patient.id,
        patient.full_name,
        patient.document_id,
        patient.age,
        patient.sequence_file,
        detected_summary(detected),
    )
}
