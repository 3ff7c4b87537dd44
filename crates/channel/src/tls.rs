//! TLS context construction for the closed bilateral trust domain.
//!
//! Both builders replace the default verification store with one holding only the bundle
//! certificate, so system roots are never consulted. The server requires a client
//! certificate.

use crate::identity::TlsIdentity;
use crate::ChannelResult;
use openssl::ssl::{
    SslAcceptor, SslConnector, SslContextBuilder, SslMethod, SslVerifyMode,
};
use openssl::x509::store::X509StoreBuilder;

fn configure(builder: &mut SslContextBuilder, identity: &TlsIdentity) -> ChannelResult<()> {
    builder.set_private_key(identity.private_key())?;
    builder.set_certificate(identity.certificate())?;
    for extra in identity.chain() {
        builder.add_extra_chain_cert(extra.clone())?;
    }
    builder.check_private_key()?;

    let mut store = X509StoreBuilder::new()?;
    store.add_cert(identity.certificate().clone())?;
    builder.set_cert_store(store.build());

    Ok(())
}

/// Builds the server-side acceptor. Clients must present the bundle certificate.
pub fn server_acceptor(identity: &TlsIdentity) -> ChannelResult<SslAcceptor> {
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server())?;
    configure(&mut builder, identity)?;
    builder.set_verify(SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT);
    Ok(builder.build())
}

/// Builds the client-side connector. The server must present the bundle certificate.
pub fn client_connector(identity: &TlsIdentity) -> ChannelResult<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    configure(&mut builder, identity)?;
    builder.set_verify(SslVerifyMode::PEER);
    Ok(builder.build())
}
