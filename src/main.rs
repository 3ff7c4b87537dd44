use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genomics_channel::{ChannelResult, SecureServer, TlsIdentity};
use genomics_core::constants::GENERIC_ERROR_REPLY;
use genomics_core::{AnalysisService, CoreConfig, NetworkSettings};
use std::net::ToSocketAddrs;

/// Main entry point for the genomics analysis server
///
/// Loads the shared certificate bundle, binds a TLS listener and services submissions one
/// connection at a time: each request frame carries a patient record, which is screened
/// against the disease corpus, reported under the results directory, and answered with a
/// status line.
///
/// # Environment Variables
/// - `GENOMICS_CERT_PATH`: PKCS#12 bundle shared with clients (required)
/// - `GENOMICS_CERT_PASSWORD`: bundle passphrase (required)
/// - `GENOMICS_SERVER_HOST`: bind host (default: "127.0.0.1")
/// - `GENOMICS_SERVER_PORT`: bind port (default: 4040)
/// - `GENOMICS_DATA_DIR`: root of `genomes/`, `diseases/` and `results/` (default: "data")
///
/// Configuration errors are fatal and reported before any socket is bound.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("genomics_server=info".parse()?)
                .add_directive("genomics_core=info".parse()?)
                .add_directive("genomics_channel=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = NetworkSettings::from_env()?;
    let cfg = Arc::new(CoreConfig::from_env());
    let identity = TlsIdentity::from_pkcs12_file(&settings.cert_path, &settings.cert_password)?;

    tracing::info!(
        "++ Starting genomics server on {}:{} (data: {})",
        settings.host,
        settings.port,
        cfg.data_dir().display()
    );

    let server = bind_server(&identity, (settings.host.as_str(), settings.port))?;
    server.run(submission_handler(AnalysisService::new(cfg)))
}

/// Binds the submission listener. Requests the channel cannot hand over, and replies too
/// large for one frame, are answered with the generic failure status.
fn bind_server(identity: &TlsIdentity, addr: impl ToSocketAddrs) -> ChannelResult<SecureServer> {
    Ok(SecureServer::bind(identity, addr)?.with_failure_reply(GENERIC_ERROR_REPLY))
}

/// Adapts the analysis service to the channel's request/reply handler.
fn submission_handler(analysis: AnalysisService) -> impl FnMut(&str) -> String {
    move |payload: &str| analysis.respond(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use genomics_certificates::IdentityBundle;
    use genomics_channel::SecureClient;
    use genomics_core::{Patient, PatientId, PatientRepository, Sex};
    use std::fs;
    use std::path::Path;
    use std::thread;
    use tempfile::TempDir;

    const PASSWORD: &str = "changeit";

    fn identity() -> TlsIdentity {
        let bundle = IdentityBundle::generate("genomics-e2e", &["localhost".to_string()], PASSWORD)
            .expect("bundle generation should succeed");
        TlsIdentity::from_pkcs12_der(bundle.der(), PASSWORD).expect("bundle should open")
    }

    fn server_data(dir: &Path, markers: &[(&str, &str)]) -> Arc<CoreConfig> {
        let cfg = Arc::new(CoreConfig::new(dir.to_path_buf()));
        fs::create_dir_all(cfg.genomes_dir()).unwrap();
        fs::create_dir_all(cfg.diseases_dir()).unwrap();
        fs::write(cfg.genomes_dir().join("patient1.fasta"), ">patient 1\nACGTACGT\n").unwrap();
        for (name, marker) in markers {
            fs::write(
                cfg.diseases_dir().join(format!("{}.fasta", name)),
                format!(">{}\n{}\n", name, marker),
            )
            .unwrap();
        }
        cfg
    }

    fn patient_one() -> Patient {
        Patient {
            id: PatientId::parse("1").unwrap(),
            full_name: "Grace Hopper".to_string(),
            document_id: "CC-1906".to_string(),
            contact_email: "grace@example.com".to_string(),
            registration_date: Utc::now(),
            age: 85,
            sex: Sex::Female,
            sequence_file: "data/adn/patient1.fasta".to_string(),
            checksum: "0".repeat(64),
            file_size_bytes: 20,
            active: true,
        }
    }

    #[test]
    fn test_submit_patient_end_to_end() {
        let server_dir = TempDir::new().expect("Failed to create temp dir");
        let client_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = server_data(server_dir.path(), &[("D1", "CGTA"), ("D2", "TTTT")]);
        let identity = identity();

        let server = bind_server(&identity, "127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut handler = submission_handler(AnalysisService::new(cfg));
            let mut sent = String::new();
            let outcome = server.serve_next(&mut |payload: &str| {
                sent = handler(payload);
                sent.clone()
            });
            (outcome, sent)
        });

        let repo = PatientRepository::new(Arc::new(CoreConfig::new(
            client_dir.path().to_path_buf(),
        )));
        repo.create(&patient_one()).unwrap();
        let stored = repo.read(&PatientId::parse("1").unwrap()).unwrap().unwrap();

        let client = SecureClient::new(&identity, "127.0.0.1", port).unwrap();
        let reply = client.exchange(&stored.to_json().unwrap()).unwrap();

        let (outcome, sent) = handle.join().unwrap();
        assert!(outcome.is_ok());
        assert_eq!(reply, "Patient Grace Hopper processed. Detected diseases: D1");
        assert_eq!(reply, sent, "client must observe exactly what the server sent");

        let report =
            fs::read_to_string(server_dir.path().join("results/patient_1_results.txt")).unwrap();
        assert!(report.contains("Detected diseases: D1"));
        assert!(report.contains("Sequence file: data/adn/patient1.fasta"));
    }

    #[test]
    fn test_server_replies_generic_error_and_keeps_serving() {
        let server_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = server_data(server_dir.path(), &[("D2", "TTTT")]);
        let identity = identity();

        let server = bind_server(&identity, "127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut handler = submission_handler(AnalysisService::new(cfg));
            (0..2)
                .map(|_| server.serve_next(&mut handler))
                .collect::<Vec<_>>()
        });

        let client = SecureClient::new(&identity, "127.0.0.1", port).unwrap();
        assert_eq!(
            client.exchange("this is not a patient").unwrap(),
            genomics_core::constants::GENERIC_ERROR_REPLY
        );
        assert_eq!(
            client.exchange(&patient_one().to_json().unwrap()).unwrap(),
            "Patient Grace Hopper processed. Detected diseases: None detected"
        );

        assert!(handle.join().unwrap().iter().all(|r| r.is_ok()));
        let report =
            fs::read_to_string(server_dir.path().join("results/patient_1_results.txt")).unwrap();
        assert!(report.contains("None detected"));
    }

    #[test]
    fn test_reply_too_large_for_a_frame_becomes_generic_error() {
        let server_dir = TempDir::new().expect("Failed to create temp dir");
        let long_names = ["A".repeat(200), "C".repeat(200), "G".repeat(200)];
        let cfg = server_data(
            server_dir.path(),
            &[
                (long_names[0].as_str(), "ACGT"),
                (long_names[1].as_str(), "CGTA"),
                (long_names[2].as_str(), "GTAC"),
            ],
        );
        let identity = identity();

        let server = bind_server(&identity, "127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut handler = submission_handler(AnalysisService::new(cfg));
            (0..2)
                .map(|_| server.serve_next(&mut handler))
                .collect::<Vec<_>>()
        });

        // The request fits in one frame; the reply repeats the name and adds three long
        // disease names, which does not.
        let mut patient = patient_one();
        patient.full_name = "N".repeat(65_000);
        let payload = patient.to_json().unwrap();
        assert!(payload.len() <= genomics_channel::MAX_FRAME_LEN);

        let client = SecureClient::new(&identity, "127.0.0.1", port).unwrap();
        assert_eq!(client.exchange(&payload).unwrap(), GENERIC_ERROR_REPLY);
        assert_eq!(
            client.exchange(&patient_one().to_json().unwrap()).unwrap(),
            format!(
                "Patient Grace Hopper processed. Detected diseases: {}",
                long_names.join(", ")
            )
        );

        assert!(handle.join().unwrap().iter().all(|r| r.is_ok()));
    }
}
