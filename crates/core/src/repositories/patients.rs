//! File-backed patient repository.
//!
//! Each patient is stored as one pretty-printed JSON file under the configured patients
//! directory:
//!
//! ```text
//! patients/
//!   patient_<id>.json
//!   patient_<id>.json
//! ```
//!
//! Records are never physically removed. Deletion is soft: the record's `is_active` flag is
//! cleared and the file rewritten.
//!
//! ## Concurrency
//!
//! Writes are plain overwrites with no locking. The analysis server is strictly serial, so no
//! two writes to the same id can race today. Servicing connections in parallel would require
//! per-id mutual exclusion around [`PatientRepository::update`] and
//! [`PatientRepository::delete`].

use crate::config::CoreConfig;
use crate::constants::{PATIENT_FILE_EXTENSION, PATIENT_FILE_PREFIX};
use crate::patient::{Patient, PatientId};
use crate::{PatientError, PatientResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Service for storing and retrieving patient records.
#[derive(Clone, Debug)]
pub struct PatientRepository {
    cfg: Arc<CoreConfig>,
}

impl PatientRepository {
    /// Creates a repository rooted at the configured patients directory.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.cfg.patients_dir()
    }

    /// Returns the deterministic record path for `id`.
    pub fn record_path(&self, id: &PatientId) -> PathBuf {
        self.patients_dir().join(format!(
            "{}{}.{}",
            PATIENT_FILE_PREFIX, id, PATIENT_FILE_EXTENSION
        ))
    }

    /// Writes a new patient record.
    ///
    /// An existing record with the same id is silently overwritten. Duplicate ids are not
    /// rejected; callers that need uniqueness must [`read`](Self::read) first.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - the patients directory cannot be created
    /// - the record cannot be serialised or written
    pub fn create(&self, patient: &Patient) -> PatientResult<PathBuf> {
        fs::create_dir_all(self.patients_dir()).map_err(PatientError::StorageDirCreation)?;

        let path = self.record_path(&patient.id);
        write_record(&path, patient)?;

        tracing::info!(patient_id = %patient.id, "patient record created");
        Ok(path)
    }

    /// Reads the record for `id`.
    ///
    /// Returns `Ok(None)` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::CorruptRecord` if the stored content cannot be parsed or holds
    /// a different `patient_id`, and `PatientError::FileRead` if the file exists but cannot
    /// be read.
    pub fn read(&self, id: &PatientId) -> PatientResult<Option<Patient>> {
        let path = self.record_path(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PatientError::FileRead(e)),
        };

        parse_record(&path, &contents).map(Some)
    }

    /// Overwrites an existing record with `patient`.
    ///
    /// This is a full replacement. To change a single field, read the record, mutate it and
    /// pass the complete value back.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` (and writes nothing) if no record exists for
    /// `patient.id`.
    pub fn update(&self, patient: &Patient) -> PatientResult<()> {
        let path = self.record_path(&patient.id);
        if !path.is_file() {
            return Err(PatientError::NotFound(patient.id.to_string()));
        }

        write_record(&path, patient)?;

        tracing::info!(patient_id = %patient.id, "patient record updated");
        Ok(())
    }

    /// Soft-deletes the record for `id` by marking it inactive.
    ///
    /// Idempotent: deleting an already inactive record succeeds and leaves it inactive.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no record exists, or any error from
    /// [`read`](Self::read) or [`update`](Self::update).
    pub fn delete(&self, id: &PatientId) -> PatientResult<()> {
        let mut patient = self
            .read(id)?
            .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

        patient.active = false;
        self.update(&patient)?;

        tracing::info!(patient_id = %id, "patient record marked inactive");
        Ok(())
    }

    /// Lists all active patients, sorted by id.
    ///
    /// Record files that cannot be read or parsed are logged as warnings and skipped, so one
    /// corrupt record never hides the others. A missing patients directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::DirectoryRead` if the patients directory exists but cannot be
    /// enumerated.
    pub fn list_active(&self) -> PatientResult<Vec<Patient>> {
        let dir = self.patients_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PatientError::DirectoryRead(e)),
        };

        let mut patients = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }

            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("failed to read patient record: {} - {}", path.display(), e);
                    continue;
                }
            };

            match parse_record(&path, &contents) {
                Ok(patient) if patient.active => patients.push(patient),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping patient record: {}", e),
            }
        }

        patients.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(patients)
    }
}

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|e| e.to_str()) == Some(PATIENT_FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(PATIENT_FILE_PREFIX))
}

/// Parses a record file. The stored `patient_id` must match the id in the file name.
fn parse_record(path: &Path, contents: &str) -> PatientResult<Patient> {
    let corrupt = |source| PatientError::CorruptRecord {
        path: path.to_path_buf(),
        source,
    };
    let patient: Patient = serde_json::from_str(contents).map_err(corrupt)?;

    let expected = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix(PATIENT_FILE_PREFIX))
        .unwrap_or_default();
    if patient.id.as_str() != expected {
        return Err(corrupt(<serde_json::Error as serde::de::Error>::custom(
            format!(
                "record holds patient_id {:?} but is stored as {:?}",
                patient.id.as_str(),
                expected
            ),
        )));
    }

    Ok(patient)
}

fn write_record(path: &Path, patient: &Patient) -> PatientResult<()> {
    let json = serde_json::to_string_pretty(patient).map_err(PatientError::Serialization)?;
    fs::write(path, json).map_err(PatientError::FileWrite)
}
