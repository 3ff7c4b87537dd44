//! Patient record types.
//!
//! A [`Patient`] is the unit stored by the repository and sent over the secure channel.
//! Its JSON shape (snake_case keys, RFC 3339 registration date) is shared by both.

use crate::constants::MAX_PATIENT_ID_LEN;
use crate::{PatientError, PatientResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated patient identifier.
///
/// The id names the record and report files, so it is restricted to ASCII alphanumerics
/// plus `-`, `_` and `.`, must not start with `.`, and is at most
/// [`MAX_PATIENT_ID_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientId(String);

impl PatientId {
    /// Parses and validates a patient id.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the id is empty, too long, starts with `.`,
    /// or contains characters outside the allowed set.
    pub fn parse(input: impl AsRef<str>) -> PatientResult<Self> {
        let id = input.as_ref().trim();

        if id.is_empty() {
            return Err(PatientError::InvalidInput(
                "patient id cannot be empty".into(),
            ));
        }

        if id.len() > MAX_PATIENT_ID_LEN {
            return Err(PatientError::InvalidInput(format!(
                "patient id exceeds maximum length of {} characters",
                MAX_PATIENT_ID_LEN
            )));
        }

        if id.starts_with('.') {
            return Err(PatientError::InvalidInput(
                "patient id cannot start with '.'".into(),
            ));
        }

        let ok = id
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

        if !ok {
            return Err(PatientError::InvalidInput(
                "patient id contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
                    .into(),
            ));
        }

        Ok(Self(id.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PatientId {
    type Error = PatientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PatientId::parse(value)
    }
}

impl From<PatientId> for String {
    fn from(id: PatientId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PatientId {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sex::Male => f.write_str("M"),
            Sex::Female => f.write_str("F"),
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Sex::Male),
            "F" | "f" => Ok(Sex::Female),
            other => Err(PatientError::InvalidInput(format!(
                "sex must be M or F, got {:?}",
                other
            ))),
        }
    }
}

fn default_active() -> bool {
    true
}

/// A clinical patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "patient_id")]
    pub id: PatientId,
    pub full_name: String,
    pub document_id: String,
    pub contact_email: String,
    pub registration_date: DateTime<Utc>,
    pub age: u32,
    pub sex: Sex,
    /// Path of the patient's FASTA file as recorded by the client.
    pub sequence_file: String,
    /// Lower-case hex SHA-256 of the sequence file.
    pub checksum: String,
    pub file_size_bytes: u64,
    #[serde(rename = "is_active", default = "default_active")]
    pub active: bool,
}

impl Patient {
    /// Serializes the record into the JSON text sent over the wire.
    pub fn to_json(&self) -> PatientResult<String> {
        serde_json::to_string(self).map_err(PatientError::Serialization)
    }

    /// Parses a record received over the wire.
    pub fn from_json(payload: &str) -> PatientResult<Self> {
        serde_json::from_str(payload).map_err(PatientError::Deserialization)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_patient(id: &str) -> Patient {
        Patient {
            id: PatientId::parse(id).unwrap(),
            full_name: "Ada Lovelace".to_string(),
            document_id: "DOC-1815".to_string(),
            contact_email: "ada@example.com".to_string(),
            registration_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            age: 36,
            sex: Sex::Female,
            sequence_file: format!("data/adn/patient{}.fasta", id),
            checksum: "ab".repeat(32),
            file_size_bytes: 128,
            active: true,
        }
    }

    #[test]
    fn test_patient_id_accepts_safe_ids() {
        for id in ["1", "patient-42", "A_b.c"] {
            assert_eq!(PatientId::parse(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_patient_id_rejects_path_like_ids() {
        for id in ["", "   ", "../etc", "a/b", ".hidden", "a b", "día"] {
            assert!(
                matches!(PatientId::parse(id), Err(PatientError::InvalidInput(_))),
                "{:?} should be rejected",
                id
            );
        }
        assert!(PatientId::parse("x".repeat(MAX_PATIENT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_patient_json_uses_snake_case_keys() {
        let json = sample_patient("1").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["patient_id"], "1");
        assert_eq!(value["sex"], "F");
        assert_eq!(value["is_active"], true);
        assert_eq!(value["registration_date"], "2024-03-01T09:30:00Z");
    }

    #[test]
    fn test_missing_is_active_defaults_to_true() {
        let mut value = serde_json::to_value(sample_patient("7")).unwrap();
        value.as_object_mut().unwrap().remove("is_active");

        let patient = Patient::from_json(&value.to_string()).unwrap();
        assert!(patient.active);
    }

    #[test]
    fn test_from_json_rejects_unsafe_id() {
        let mut value = serde_json::to_value(sample_patient("7")).unwrap();
        value["patient_id"] = serde_json::Value::String("../../x".into());

        let err = Patient::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, PatientError::Deserialization(_)));
    }

    #[test]
    fn test_sex_parses_case_insensitively() {
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!(" F ".parse::<Sex>().unwrap(), Sex::Female);
        assert!("X".parse::<Sex>().is_err());
    }
}
