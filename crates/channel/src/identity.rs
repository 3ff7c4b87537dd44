use crate::{ChannelError, ChannelResult};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::path::Path;

/// Identity and trust anchor loaded from a PKCS#12 bundle.
///
/// The same value configures both roles: the key and certificate are presented to the peer,
/// and the certificate is the only one a peer is verified against.
pub struct TlsIdentity {
    key: PKey<Private>,
    certificate: X509,
    chain: Vec<X509>,
}

impl TlsIdentity {
    /// Opens a PKCS#12 bundle held in memory.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::BundleParse` for a wrong password or malformed bundle, and
    /// `MissingPrivateKey` / `MissingCertificate` if the bundle lacks either part.
    pub fn from_pkcs12_der(der: &[u8], password: &str) -> ChannelResult<Self> {
        let parsed = Pkcs12::from_der(der)
            .and_then(|bundle| bundle.parse2(password))
            .map_err(ChannelError::BundleParse)?;

        let key = parsed.pkey.ok_or(ChannelError::MissingPrivateKey)?;
        let certificate = parsed.cert.ok_or(ChannelError::MissingCertificate)?;
        let chain = parsed
            .ca
            .map(|stack| stack.into_iter().collect())
            .unwrap_or_default();

        Ok(Self {
            key,
            certificate,
            chain,
        })
    }

    /// Reads and opens a PKCS#12 bundle file.
    pub fn from_pkcs12_file(path: &Path, password: &str) -> ChannelResult<Self> {
        let der = std::fs::read(path).map_err(|source| ChannelError::BundleRead {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = Self::from_pkcs12_der(&der, password)?;

        tracing::debug!(path = %path.display(), "loaded certificate bundle");
        Ok(identity)
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.key
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// Extra certificates shipped in the bundle, if any.
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subject = self
            .certificate
            .subject_name()
            .entries()
            .filter_map(|e| e.data().as_utf8().ok().map(|s| s.to_string()))
            .collect::<Vec<_>>()
            .join(",");

        f.debug_struct("TlsIdentity")
            .field("subject", &subject)
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genomics_certificates::IdentityBundle;
    use tempfile::TempDir;

    fn bundle(password: &str) -> Vec<u8> {
        IdentityBundle::generate("genomics-test", &["localhost".to_string()], password)
            .expect("bundle generation should succeed")
            .into_der()
    }

    #[test]
    fn test_from_pkcs12_der_opens_bundle() {
        let identity = TlsIdentity::from_pkcs12_der(&bundle("changeit"), "changeit").unwrap();

        assert!(identity.chain().is_empty());
        assert!(format!("{:?}", identity).contains("genomics-test"));
        let public = identity.certificate().public_key().unwrap();
        assert!(identity.private_key().public_eq(&public));
    }

    #[test]
    fn test_from_pkcs12_der_rejects_wrong_password() {
        let err = TlsIdentity::from_pkcs12_der(&bundle("changeit"), "nope").unwrap_err();
        assert!(matches!(err, ChannelError::BundleParse(_)));
    }

    #[test]
    fn test_from_pkcs12_file_reports_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let err =
            TlsIdentity::from_pkcs12_file(&temp_dir.path().join("absent.p12"), "x").unwrap_err();
        assert!(matches!(err, ChannelError::BundleRead { .. }));
    }
}
