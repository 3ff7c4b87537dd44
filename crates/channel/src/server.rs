use crate::frame::{encode_frame, read_frame};
use crate::identity::TlsIdentity;
use crate::tls::server_acceptor;
use crate::{ChannelError, ChannelResult};
use openssl::ssl::SslAcceptor;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Pause after a failed `accept`, so a persistent fault such as descriptor exhaustion does not
/// spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Computes the reply for one request.
///
/// Handlers return text, never errors: a request that cannot be processed should still get a
/// status reply.
pub trait ExchangeHandler {
    fn handle(&mut self, request: &str) -> String;
}

impl<F> ExchangeHandler for F
where
    F: FnMut(&str) -> String,
{
    fn handle(&mut self, request: &str) -> String {
        self(request)
    }
}

/// Blocking, strictly serial TLS server.
///
/// One connection is accepted and fully serviced (handshake, read, handle, write, close)
/// before the next is accepted.
pub struct SecureServer {
    listener: TcpListener,
    acceptor: SslAcceptor,
    failure_reply: Option<String>,
}

impl SecureServer {
    /// Binds a listener configured with `identity`.
    pub fn bind(identity: &TlsIdentity, addr: impl ToSocketAddrs) -> ChannelResult<Self> {
        let acceptor = server_acceptor(identity)?;
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            acceptor,
            failure_reply: None,
        })
    }

    /// Sets the status sent when a complete request cannot be handed to the handler (the
    /// payload is not UTF-8) or when the handler's reply does not fit in one frame.
    ///
    /// Without it such exchanges are closed with no reply.
    pub fn with_failure_reply(mut self, reply: impl Into<String>) -> Self {
        self.failure_reply = Some(reply.into());
        self
    }

    pub fn local_addr(&self) -> ChannelResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and services exactly one connection.
    ///
    /// Returns the peer address on success. Any failure concerns this connection only; the
    /// socket is closed when this returns, on every path.
    pub fn serve_next<H: ExchangeHandler>(&self, handler: &mut H) -> ChannelResult<SocketAddr> {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("accept failed: {}", e);
                return Err(ChannelError::Accept(e));
            }
        };
        tracing::debug!(%peer, "connection accepted");

        match self.service(stream, handler) {
            Ok(()) => {
                tracing::info!(%peer, "exchange complete");
                Ok(peer)
            }
            Err(e) => {
                tracing::warn!(%peer, "exchange aborted: {}", e);
                Err(e)
            }
        }
    }

    /// Runs the accept loop forever.
    ///
    /// Failed exchanges are logged by [`serve_next`](Self::serve_next) and the loop continues
    /// with the next connection.
    pub fn run<H: ExchangeHandler>(&self, mut handler: H) -> ! {
        if let Ok(addr) = self.local_addr() {
            tracing::info!("secure server listening on {}", addr);
        }

        loop {
            let outcome = self.serve_next(&mut handler);
            if let Some(pause) = pause_after(&outcome) {
                thread::sleep(pause);
            }
        }
    }

    fn service<H: ExchangeHandler>(&self, stream: TcpStream, handler: &mut H) -> ChannelResult<()> {
        let mut tls = self
            .acceptor
            .accept(stream)
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;

        let reply = match read_frame(&mut tls) {
            Ok(request) => handler.handle(&request),
            Err(e @ ChannelError::InvalidUtf8(_)) => self.fall_back(e)?,
            Err(e) => return Err(e),
        };
        let frame = match encode_frame(&reply) {
            Ok(frame) => frame,
            Err(e) => encode_frame(&self.fall_back(e)?)?,
        };

        tls.write_all(&frame)?;
        tls.flush()?;

        // Best effort close_notify; the TCP socket is closed on drop either way.
        let _ = tls.shutdown();
        Ok(())
    }

    /// Substitutes the failure reply for `error`, or returns the error if none is set.
    fn fall_back(&self, error: ChannelError) -> ChannelResult<String> {
        match &self.failure_reply {
            Some(reply) => {
                tracing::warn!("sending failure reply: {}", error);
                Ok(reply.clone())
            }
            None => Err(error),
        }
    }
}

fn pause_after(outcome: &ChannelResult<SocketAddr>) -> Option<Duration> {
    match outcome {
        Err(ChannelError::Accept(_)) => Some(ACCEPT_BACKOFF),
        _ => None,
    }
}
