//! FASTA sequence reading.
//!
//! Header lines (starting with `>`) are dropped and the remaining lines are trimmed and
//! concatenated without separators. Multi-record files therefore collapse into one sequence.

use crate::{PatientError, PatientResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Extracts the sequence body from FASTA text.
pub fn sequence_from_fasta(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('>'))
        .map(str::trim)
        .collect()
}

/// Reads a FASTA file and returns its concatenated sequence body.
///
/// # Errors
///
/// Returns `PatientError::SequenceRead` if the file cannot be opened or read.
pub fn read_sequence(path: &Path) -> PatientResult<String> {
    let to_err = |source| PatientError::SequenceRead {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    let mut sequence = String::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(to_err)?;
        if !line.starts_with('>') {
            sequence.push_str(line.trim());
        }
    }

    Ok(sequence)
}

/// Checksum and size of a sequence file, as stored on the patient record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFileInfo {
    /// Lower-case hex SHA-256 digest.
    pub checksum: String,
    pub size_bytes: u64,
}

/// Hashes a sequence file and measures its size.
pub fn describe_sequence_file(path: &Path) -> PatientResult<SequenceFileInfo> {
    let to_err = |source| PatientError::SequenceRead {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(to_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut size_bytes = 0u64;

    loop {
        let n = file.read(&mut buffer).map_err(to_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        size_bytes += n as u64;
    }

    Ok(SequenceFileInfo {
        checksum: hex::encode(hasher.finalize()),
        size_bytes,
    })
}
