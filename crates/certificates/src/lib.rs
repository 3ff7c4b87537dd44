//! Shared identity/trust bundle generation.
//!
//! Both ends of the secure channel load the same password-protected PKCS#12 bundle and use
//! its certificate as their own identity and as their only trust anchor. This crate creates
//! such bundles: a self-signed X.509 certificate (via `rcgen`) packed with its private key
//! into PKCS#12 DER (via `openssl`).

use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::x509::X509;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    SerialNumber,
};
use std::path::Path;
use thiserror::Error;

/// Friendly name stored in generated bundles.
pub const BUNDLE_FRIENDLY_NAME: &str = "genomics";

/// Errors that can occur during certificate or bundle creation.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Failed to generate certificate: {0}")]
    GenerationError(String),
    #[error("Failed to build PKCS#12 bundle: {0}")]
    BundleError(#[from] openssl::error::ErrorStack),
    #[error("Failed to write bundle: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Self-signed X.509 certificates for the closed trust domain.
pub struct Certificate;

impl Certificate {
    /// Creates a new self-signed X.509 certificate valid for server and client authentication.
    ///
    /// # Arguments
    ///
    /// * `common_name` - Common Name of the subject.
    /// * `hosts` - DNS names or IP addresses placed in subjectAltName.
    ///
    /// # Returns
    ///
    /// A tuple of (X.509 certificate PEM, private key PEM).
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::GenerationError` if a host is not a valid SAN or
    /// certificate generation fails.
    pub fn create(
        common_name: &str,
        hosts: &[String],
    ) -> Result<(String, String), CertificateError> {
        let mut params = CertificateParams::new(hosts.to_vec())
            .map_err(|e| CertificateError::GenerationError(e.to_string()))?;

        let mut subject = DistinguishedName::new();
        subject.push(DnType::CommonName, common_name);
        params.distinguished_name = subject;

        params.is_ca = IsCa::NoCa;
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        // Valid for one year from now
        let now = time::OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + time::Duration::days(365);

        let serial = now.unix_timestamp_nanos().to_be_bytes();
        params.serial_number = Some(SerialNumber::from(serial[8..].to_vec()));

        let key_pair =
            KeyPair::generate().map_err(|e| CertificateError::GenerationError(e.to_string()))?;

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| CertificateError::GenerationError(e.to_string()))?;

        Ok((cert.pem(), key_pair.serialize_pem()))
    }
}

/// A password-protected PKCS#12 bundle holding one certificate and its key.
pub struct IdentityBundle {
    der: Vec<u8>,
}

impl IdentityBundle {
    /// Generates a fresh self-signed identity and packs it with `password`.
    pub fn generate(
        common_name: &str,
        hosts: &[String],
        password: &str,
    ) -> Result<Self, CertificateError> {
        let (cert_pem, key_pem) = Certificate::create(common_name, hosts)?;
        Self::from_pem(&cert_pem, &key_pem, password)
    }

    /// Packs an existing PEM certificate and private key.
    pub fn from_pem(
        cert_pem: &str,
        key_pem: &str,
        password: &str,
    ) -> Result<Self, CertificateError> {
        let cert = X509::from_pem(cert_pem.as_bytes())?;
        let pkey = PKey::private_key_from_pem(key_pem.as_bytes())?;

        let pkcs12 = Pkcs12::builder()
            .name(BUNDLE_FRIENDLY_NAME)
            .pkey(&pkey)
            .cert(&cert)
            .build2(password)?;

        Ok(Self {
            der: pkcs12.to_der()?,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// Writes the bundle to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), CertificateError> {
        std::fs::write(path, &self.der)?;
        Ok(())
    }
}
