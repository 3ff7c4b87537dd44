use crate::frame::{encode_frame, read_frame};
use crate::identity::TlsIdentity;
use crate::tls::client_connector;
use crate::{ChannelError, ChannelResult};
use openssl::ssl::SslConnector;
use std::io::Write;
use std::net::TcpStream;

/// Client side of the secure channel.
///
/// Every [`exchange`](Self::exchange) opens a fresh connection, performs a full handshake,
/// sends one frame, reads one frame and closes.
pub struct SecureClient {
    connector: SslConnector,
    host: String,
    port: u16,
}

impl SecureClient {
    pub fn new(identity: &TlsIdentity, host: impl Into<String>, port: u16) -> ChannelResult<Self> {
        Ok(Self {
            connector: client_connector(identity)?,
            host: host.into(),
            port,
        })
    }

    /// Sends `request` and returns the server's reply text.
    ///
    /// The request is framed before connecting, so an oversized payload fails with
    /// `ChannelError::PayloadTooLarge` without any network traffic.
    ///
    /// Host names are not checked against the server certificate: trust is pinned to the
    /// bundle certificate, which the handshake verifies.
    pub fn exchange(&self, request: &str) -> ChannelResult<String> {
        let frame = encode_frame(request)?;

        let tcp = TcpStream::connect((self.host.as_str(), self.port))?;
        tracing::info!("connected to {}:{}", self.host, self.port);

        let mut tls = self
            .connector
            .configure()?
            .verify_hostname(false)
            .connect(&self.host, tcp)
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;

        tls.write_all(&frame)?;
        tls.flush()?;
        let reply = read_frame(&mut tls)?;

        let _ = tls.shutdown();
        Ok(reply)
    }
}
