use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error(
        "corrupt patient record (path: {path}): {source}",
        path = path.display()
    )]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write patient file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to list patient directory: {0}")]
    DirectoryRead(std::io::Error),
    #[error("failed to serialize patient: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patient payload: {0}")]
    Deserialization(serde_json::Error),
    #[error(
        "failed to read sequence file (path: {path}): {source}",
        path = path.display()
    )]
    SequenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list disease corpus: {0}")]
    CorpusRead(std::io::Error),
    #[error("failed to create results directory: {0}")]
    ResultsDirCreation(std::io::Error),
    #[error("failed to write analysis report: {0}")]
    ReportWrite(std::io::Error),
}

impl PatientError {
    /// True for filesystem faults, as opposed to missing, corrupt or invalid data.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            PatientError::StorageDirCreation(_)
                | PatientError::FileWrite(_)
                | PatientError::FileRead(_)
                | PatientError::DirectoryRead(_)
                | PatientError::SequenceRead { .. }
                | PatientError::CorpusRead(_)
                | PatientError::ResultsDirCreation(_)
                | PatientError::ReportWrite(_)
        )
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Errors raised while resolving startup configuration.
///
/// These are fatal: binaries report them and exit before binding sockets or
/// touching storage.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required configuration value {0} is not set")]
    MissingVar(&'static str),
    #[error("invalid port {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
