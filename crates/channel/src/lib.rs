//! # Genomics Channel
//!
//! Point-to-point secure transport carrying exactly one request and one reply per connection.
//!
//! ## Trust model
//!
//! Client and server are configured from the same password-protected PKCS#12 bundle. The
//! bundle's certificate is each party's identity and also its only trust anchor, so any peer
//! holding the bundle is trusted and nothing else is. Credentials are passed explicitly as a
//! [`TlsIdentity`]; no process-wide TLS state is touched.
//!
//! ## Wire format
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u16 (BE)  | len bytes of UTF-8 text   |
//! +----------------+---------------------------+
//! ```
//!
//! The client sends one frame, the server answers with one frame, both sides close. Each
//! request needs a new connection and a new handshake.
//!
//! ## Limitations
//!
//! The server is strictly serial and sets no timeouts. A peer that connects and never sends
//! its frame stalls the server until the connection drops.

mod client;
mod frame;
mod identity;
mod server;
mod tls;

pub use client::SecureClient;
pub use frame::{encode_frame, read_frame, write_frame, MAX_FRAME_LEN};
pub use identity::TlsIdentity;
pub use server::{ExchangeHandler, SecureServer};
pub use tls::{client_connector, server_acceptor};

use std::path::PathBuf;

/// Errors raised by the secure channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(
        "failed to read certificate bundle (path: {path}): {source}",
        path = path.display()
    )]
    BundleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Wrong password or not a PKCS#12 container.
    #[error("failed to open certificate bundle: {0}")]
    BundleParse(openssl::error::ErrorStack),
    #[error("certificate bundle contains no private key")]
    MissingPrivateKey,
    #[error("certificate bundle contains no certificate")]
    MissingCertificate,
    #[error("TLS configuration error: {0}")]
    Tls(#[from] openssl::error::ErrorStack),
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload of {len} bytes exceeds the {max} byte frame limit", max = MAX_FRAME_LEN)]
    PayloadTooLarge { len: usize },
    #[error("frame payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("connection closed before a complete frame was received")]
    Truncated,
}

impl ChannelError {
    /// True for malformed or oversized frames, as opposed to transport failures.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            ChannelError::PayloadTooLarge { .. }
                | ChannelError::InvalidUtf8(_)
                | ChannelError::Truncated
        )
    }
}

pub type ChannelResult<T> = std::result::Result<T, ChannelError>;
