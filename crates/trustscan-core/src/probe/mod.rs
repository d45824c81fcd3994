//! TLS chain prober: one handshake against one host with exactly one vendor
//! bundle as the trust-anchor set.
//!
//! Connection-level failures (timeout, refused, DNS, plaintext peer) are
//! reported as [`ProbeError`] and never carry a chain. A completed handshake
//! always yields the peer chain plus the authorization verdict, because the
//! verifier records validation failures instead of aborting.

mod verifier;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, ServerName};
use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::ProbeError;
use crate::store::TrustAnchorBundle;
use crate::x509;
use verifier::RecordingVerifier;

/// Default per-probe deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Validation failure reasons the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationFailure {
    CertificateExpired,
    HostnameMismatch,
    SelfSignedLeaf,
    SelfSignedInChain,
    Unrecognized,
}

/// Raw result of one completed handshake.
#[derive(Debug)]
pub struct ProbeOutcome {
    /// Peer chain as presented, leaf first.
    pub peer_chain: Vec<CertificateDer<'static>>,
    /// Whether the chain validated against the vendor bundle.
    pub authorized: bool,
    /// Present exactly when `authorized` is false.
    pub failure: Option<ValidationFailure>,
}

/// Probe `host:port` using `bundle` as the only trust anchors.
///
/// Stateless; one invocation evaluates one (host, vendor) pair. The deadline
/// covers resolution, connection and handshake; the socket is closed on every
/// exit path.
pub async fn probe_host(
    host: &str,
    port: u16,
    timeout: Duration,
    bundle: &TrustAnchorBundle,
) -> Result<ProbeOutcome, ProbeError> {
    match tokio::time::timeout(timeout, probe_inner(host, port, bundle)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::Timeout),
    }
}

async fn probe_inner(
    host: &str,
    port: u16,
    bundle: &TrustAnchorBundle,
) -> Result<ProbeOutcome, ProbeError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| ProbeError::DnsFailure(e.to_string()))?
        .collect();
    if addrs.is_empty() {
        return Err(ProbeError::DnsFailure(format!("no addresses for {host}")));
    }

    let stream = connect_any(&addrs).await?;

    let (recorder, config) = client_config(bundle)?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| ProbeError::Connection(format!("invalid server name: {e}")))?;

    let connector = TlsConnector::from(Arc::new(config));
    let mut tls = connector
        .connect(server_name, stream)
        .await
        .map_err(classify_handshake_error)?;

    let peer_chain: Vec<CertificateDer<'static>> = tls
        .get_ref()
        .1
        .peer_certificates()
        .map(|certs| certs.to_vec())
        .unwrap_or_default();

    let _ = tls.shutdown().await;

    match recorder.verdict() {
        None => Ok(ProbeOutcome {
            peer_chain,
            authorized: true,
            failure: None,
        }),
        Some(err) => {
            let failure = interpret_validation_error(&err, &peer_chain);
            Ok(ProbeOutcome {
                peer_chain,
                authorized: false,
                failure: Some(failure),
            })
        }
    }
}

async fn connect_any(addrs: &[SocketAddr]) -> Result<TcpStream, ProbeError> {
    let mut last: Option<std::io::Error> = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last = Some(e),
        }
    }
    match last {
        Some(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            Err(ProbeError::ConnectionRefused)
        }
        Some(e) => Err(ProbeError::Connection(e.to_string())),
        None => Err(ProbeError::DnsFailure("empty address set".to_string())),
    }
}

fn client_config(
    bundle: &TrustAnchorBundle,
) -> Result<(Arc<RecordingVerifier>, ClientConfig), ProbeError> {
    let recorder = RecordingVerifier::new(bundle)
        .map_err(|e| ProbeError::Connection(format!("trust anchor setup failed: {e}")))?;
    let config = ClientConfig::builder_with_provider(verifier::crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| ProbeError::Connection(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(recorder.clone())
        .with_no_client_auth();
    Ok((recorder, config))
}

fn classify_handshake_error(err: std::io::Error) -> ProbeError {
    if let Some(tls_err) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        if matches!(tls_err, rustls::Error::InvalidMessage(_)) {
            return ProbeError::ProtocolMismatch;
        }
    }
    match err.kind() {
        std::io::ErrorKind::ConnectionRefused => ProbeError::ConnectionRefused,
        _ => ProbeError::Connection(err.to_string()),
    }
}

/// Interpret the TLS stack's validation error into the closed failure set.
///
/// `UnknownIssuer` is refined by inspecting the presented chain: a
/// self-signed leaf alone maps to `SelfSignedLeaf`, a self-signed
/// certificate further up maps to `SelfSignedInChain`.
fn interpret_validation_error(
    err: &rustls::Error,
    peer_chain: &[CertificateDer<'_>],
) -> ValidationFailure {
    use rustls::CertificateError;

    let rustls::Error::InvalidCertificate(cert_err) = err else {
        return ValidationFailure::Unrecognized;
    };
    match cert_err {
        CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
            ValidationFailure::CertificateExpired
        }
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            ValidationFailure::HostnameMismatch
        }
        CertificateError::UnknownIssuer => refine_unknown_issuer(peer_chain),
        _ => ValidationFailure::Unrecognized,
    }
}

fn refine_unknown_issuer(peer_chain: &[CertificateDer<'_>]) -> ValidationFailure {
    let self_issued: Vec<bool> = peer_chain
        .iter()
        .map(|der| {
            x509::decode(der.as_ref())
                .map(|cert| x509::is_self_issued(&cert))
                .unwrap_or(false)
        })
        .collect();

    match self_issued.as_slice() {
        [true] => ValidationFailure::SelfSignedLeaf,
        rest if rest.iter().any(|s| *s) => ValidationFailure::SelfSignedInChain,
        _ => ValidationFailure::Unrecognized,
    }
}
