//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services and channels. Nothing below the binaries reads process-wide
//! environment variables, so several repositories, channels or test instances with different
//! settings can coexist in one process.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DISEASES_DIR_NAME,
    ENV_CERT_PASSWORD, ENV_CERT_PATH, ENV_DATA_DIR, ENV_SERVER_HOST, ENV_SERVER_PORT,
    GENOMES_DIR_NAME, PATIENTS_DIR_NAME, RESULTS_DIR_NAME,
};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Storage configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Build from the optional value of `GENOMICS_DATA_DIR`.
    ///
    /// Empty or whitespace values fall back to [`DEFAULT_DATA_DIR`].
    pub fn from_env_value(value: Option<String>) -> Self {
        let dir = non_blank(value).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(PathBuf::from(dir))
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(ENV_DATA_DIR).ok())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join(RESULTS_DIR_NAME)
    }

    pub fn genomes_dir(&self) -> PathBuf {
        self.data_dir.join(GENOMES_DIR_NAME)
    }

    pub fn diseases_dir(&self) -> PathBuf {
        self.data_dir.join(DISEASES_DIR_NAME)
    }
}

/// Credentials and address shared by the client and server roles.
#[derive(Clone)]
pub struct NetworkSettings {
    pub cert_path: PathBuf,
    pub cert_password: String,
    pub host: String,
    pub port: u16,
}

impl std::fmt::Debug for NetworkSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSettings")
            .field("cert_path", &self.cert_path)
            .field("cert_password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl NetworkSettings {
    /// Resolve network settings from optional raw values.
    ///
    /// The bundle path and password are required. Host and port fall back to
    /// [`DEFAULT_SERVER_HOST`] and [`DEFAULT_SERVER_PORT`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when a credential is missing or blank and
    /// [`ConfigError::InvalidPort`] when the port is not a valid `u16`.
    pub fn from_values(
        cert_path: Option<String>,
        cert_password: Option<String>,
        host: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let cert_path = non_blank(cert_path).ok_or(ConfigError::MissingVar(ENV_CERT_PATH))?;
        // Passwords are taken verbatim, only absence or emptiness is rejected.
        let cert_password = cert_password
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingVar(ENV_CERT_PASSWORD))?;

        let host = non_blank(host).unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        let port = match non_blank(port) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            cert_path: PathBuf::from(cert_path),
            cert_password,
            host,
            port,
        })
    }

    /// Resolve network settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var(ENV_CERT_PATH).ok(),
            std::env::var(ENV_CERT_PASSWORD).ok(),
            std::env::var(ENV_SERVER_HOST).ok(),
            std::env::var(ENV_SERVER_PORT).ok(),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_core_config_derives_directories() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/genomics"));
        assert_eq!(cfg.patients_dir(), PathBuf::from("/srv/genomics/patients"));
        assert_eq!(cfg.results_dir(), PathBuf::from("/srv/genomics/results"));
        assert_eq!(cfg.genomes_dir(), PathBuf::from("/srv/genomics/genomes"));
        assert_eq!(cfg.diseases_dir(), PathBuf::from("/srv/genomics/diseases"));
    }

    #[test]
    fn test_core_config_blank_value_uses_default() {
        let cfg = CoreConfig::from_env_value(some("   "));
        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_network_settings_defaults() {
        let settings =
            NetworkSettings::from_values(some("certs/bundle.p12"), some("secret"), None, None)
                .expect("settings should resolve");

        assert_eq!(settings.cert_path, PathBuf::from("certs/bundle.p12"));
        assert_eq!(settings.cert_password, "secret");
        assert_eq!(settings.host, DEFAULT_SERVER_HOST);
        assert_eq!(settings.port, DEFAULT_SERVER_PORT);
    }

    #[test]
    fn test_network_settings_requires_credentials() {
        let err = NetworkSettings::from_values(None, some("secret"), None, None)
            .expect_err("missing path should fail");
        assert!(matches!(err, ConfigError::MissingVar(ENV_CERT_PATH)));

        let err = NetworkSettings::from_values(some("bundle.p12"), some(""), None, None)
            .expect_err("empty password should fail");
        assert!(matches!(err, ConfigError::MissingVar(ENV_CERT_PASSWORD)));
    }

    #[test]
    fn test_network_settings_rejects_bad_port() {
        let err = NetworkSettings::from_values(
            some("bundle.p12"),
            some("secret"),
            some("localhost"),
            some("70000"),
        )
        .expect_err("out of range port should fail");
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn test_network_settings_debug_redacts_password() {
        let settings =
            NetworkSettings::from_values(some("bundle.p12"), some("hunter2"), None, some("2020"))
                .expect("settings should resolve");
        assert_eq!(settings.port, 2020);
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
