//! Disease marker matching.
//!
//! A patient is screened by exact, case-sensitive substring search of each disease marker in
//! the patient's sequence. There is no scoring, partial matching or reverse-complement
//! comparison. Each corpus entry is a linear scan, so a full analysis is O(n·m) over the
//! corpus.

use crate::constants::FASTA_EXTENSION;
use crate::fasta::{read_sequence, sequence_from_fasta};
use crate::{PatientError, PatientResult};
use std::fs;
use std::path::Path;

/// A named disease marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseRecord {
    pub name: String,
    /// Marker sequence with FASTA headers and line whitespace removed.
    pub marker: String,
}

impl DiseaseRecord {
    pub fn new(name: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: marker.into(),
        }
    }

    /// Builds a record from raw FASTA text.
    pub fn from_fasta(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, sequence_from_fasta(text))
    }
}

/// Loads the disease corpus from a directory of `<name>.fasta` files.
///
/// Files without the `.fasta` extension are ignored. The result is sorted by name. The corpus
/// is read fresh on every call.
///
/// # Errors
///
/// Returns `PatientError::CorpusRead` if the directory cannot be listed and
/// `PatientError::SequenceRead` if a marker file cannot be read.
pub fn load_corpus(dir: &Path) -> PatientResult<Vec<DiseaseRecord>> {
    let mut corpus = Vec::new();

    for entry in fs::read_dir(dir).map_err(PatientError::CorpusRead)? {
        let path = entry.map_err(PatientError::CorpusRead)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(FASTA_EXTENSION)
        {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("skipping marker file with non UTF-8 name: {}", path.display());
            continue;
        };

        corpus.push(DiseaseRecord::new(name, read_sequence(&path)?));
    }

    corpus.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(entries = corpus.len(), "disease corpus loaded");
    Ok(corpus)
}

/// Returns the names of all diseases whose marker occurs in `patient_sequence`.
///
/// The corpus is visited in name order (stable for equal names) regardless of the order it
/// was passed in, so the output is reproducible. Each entry contributes its name at most
/// once. Entries with an empty marker are skipped.
pub fn analyze(patient_sequence: &str, corpus: &[DiseaseRecord]) -> Vec<String> {
    let mut ordered: Vec<&DiseaseRecord> = corpus.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let mut detected = Vec::new();
    for record in ordered {
        if record.marker.is_empty() {
            tracing::warn!(disease = %record.name, "skipping disease with empty marker");
            continue;
        }
        if patient_sequence.contains(record.marker.as_str()) {
            detected.push(record.name.clone());
        }
    }

    detected
}
