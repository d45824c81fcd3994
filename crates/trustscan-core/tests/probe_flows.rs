//! End-to-end probe and orchestration tests against local TLS listeners.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use trustscan_core::{
    load_bundle, probe_host, Evaluator, ProbeError, Target, TrustAnchorBundle,
    ValidationFailure, Vendor, SCORE_PLAINTEXT, SCORE_TRUSTED, SCORE_UNTRUSTED,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

struct TestCa {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl TestCa {
    fn new(cn: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, cn);
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    fn bundle(&self, vendor: Vendor) -> Arc<TrustAnchorBundle> {
        Arc::new(load_bundle(vendor, self.cert.pem().as_bytes()).unwrap())
    }

    fn issue(
        &self,
        sans: &[&str],
        window: Option<(time::OffsetDateTime, time::OffsetDateTime)>,
    ) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        let key = KeyPair::generate().unwrap();
        let names: Vec<String> = sans.iter().map(|s| s.to_string()).collect();
        let mut params = CertificateParams::new(names).unwrap();
        params
            .distinguished_name
            .push(DnType::CommonName, sans.first().copied().unwrap_or("leaf"));
        if let Some((not_before, not_after)) = window {
            params.not_before = not_before;
            params.not_after = not_after;
        }
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        let chain = vec![cert.der().clone(), self.cert.der().clone()];
        let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));
        (chain, key_der)
    }
}

fn self_signed_leaf(san: &str) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![san.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, san);
    let cert = params.self_signed(&key).unwrap();
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));
    (vec![cert.der().clone()], key_der)
}

async fn spawn_tls_server(
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> SocketAddr {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let mut buf = [0u8; 1];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });
    addr
}

/// Listener that answers every connection with plaintext HTTP.
async fn spawn_plaintext_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = stream
                    .write_all(b"HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\n\r\n")
                    .await;
                let _ = stream.flush().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
            });
        }
    });
    addr
}

/// Listener that accepts the TCP connection and then stays silent.
async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(stream);
            });
        }
    });
    addr
}

/// Reserve a port and close it again, so connections are refused.
async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_trusted_chain_is_authorized() {
    let ca = TestCa::new("Probe Flow CA");
    let (chain, key) = ca.issue(&["localhost"], None);
    let addr = spawn_tls_server(chain, key).await;
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let outcome = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    assert!(outcome.authorized);
    assert!(outcome.failure.is_none());
    assert_eq!(outcome.peer_chain.len(), 2);
}

#[tokio::test]
async fn test_untrusted_ca_reports_self_signed_in_chain() {
    let ca = TestCa::new("Untrusted CA");
    let other = TestCa::new("Other CA");
    let (chain, key) = ca.issue(&["localhost"], None);
    let addr = spawn_tls_server(chain, key).await;
    let bundle = other.bundle(Vendor::MozillaFirefox);

    let outcome = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    assert!(!outcome.authorized);
    assert_eq!(outcome.failure, Some(ValidationFailure::SelfSignedInChain));
    // The chain is still retrievable on validation failure.
    assert_eq!(outcome.peer_chain.len(), 2);
}

#[tokio::test]
async fn test_self_signed_leaf_is_recognized() {
    let other = TestCa::new("Bundle CA");
    let (chain, key) = self_signed_leaf("localhost");
    let addr = spawn_tls_server(chain, key).await;
    let bundle = other.bundle(Vendor::MicrosoftEdge);

    let outcome = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    assert!(!outcome.authorized);
    assert_eq!(outcome.failure, Some(ValidationFailure::SelfSignedLeaf));
    assert_eq!(outcome.peer_chain.len(), 1);
}

#[tokio::test]
async fn test_expired_leaf_reports_certificate_expired() {
    let ca = TestCa::new("Expiry CA");
    let window = (
        rcgen::date_time_ymd(2020, 1, 1),
        rcgen::date_time_ymd(2021, 1, 1),
    );
    let (chain, key) = ca.issue(&["localhost"], Some(window));
    let addr = spawn_tls_server(chain, key).await;
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let outcome = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    assert!(!outcome.authorized);
    assert_eq!(outcome.failure, Some(ValidationFailure::CertificateExpired));

    let score =
        trustscan_core::score_handshake(Vendor::GoogleChrome, outcome.authorized, outcome.failure)
            .unwrap();
    assert_eq!(score.score, SCORE_UNTRUSTED);
}

#[tokio::test]
async fn test_wrong_name_reports_hostname_mismatch() {
    let ca = TestCa::new("Name CA");
    let (chain, key) = ca.issue(&["example.com"], None);
    let addr = spawn_tls_server(chain, key).await;
    let bundle = ca.bundle(Vendor::MozillaFirefox);

    let outcome = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    assert!(!outcome.authorized);
    assert_eq!(outcome.failure, Some(ValidationFailure::HostnameMismatch));
}

#[tokio::test]
async fn test_plaintext_peer_is_protocol_mismatch() {
    let ca = TestCa::new("Plain CA");
    let addr = spawn_plaintext_server().await;
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let err = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap_err();
    assert_eq!(err, ProbeError::ProtocolMismatch);
}

#[tokio::test]
async fn test_refused_port_is_connection_refused() {
    let ca = TestCa::new("Refused CA");
    let port = refused_port().await;
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let err = probe_host("127.0.0.1", port, PROBE_TIMEOUT, &bundle)
        .await
        .unwrap_err();
    assert_eq!(err, ProbeError::ConnectionRefused);
}

#[tokio::test]
async fn test_unresolvable_host_is_a_hard_failure() {
    let ca = TestCa::new("DNS CA");
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let err = probe_host("does-not-exist.invalid", 443, PROBE_TIMEOUT, &bundle)
        .await
        .unwrap_err();
    // Resolution failure surfaces as DnsFailure, or Timeout when the
    // resolver itself stalls; either way it is not scoreable.
    assert!(matches!(
        err,
        ProbeError::DnsFailure(_) | ProbeError::Timeout
    ));
    assert!(trustscan_core::score_connection(Vendor::GoogleChrome, &err).is_none());
}

#[tokio::test]
async fn test_silent_listener_times_out() {
    let ca = TestCa::new("Timeout CA");
    let addr = spawn_silent_server().await;
    let bundle = ca.bundle(Vendor::GoogleChrome);

    let err = probe_host(
        "localhost",
        addr.port(),
        Duration::from_millis(300),
        &bundle,
    )
    .await
    .unwrap_err();
    assert_eq!(err, ProbeError::Timeout);
}

#[tokio::test]
async fn test_probe_is_idempotent_against_stable_peer() {
    let ca = TestCa::new("Stable CA");
    let (chain, key) = ca.issue(&["localhost"], None);
    let addr = spawn_tls_server(chain, key).await;
    let bundle = ca.bundle(Vendor::MicrosoftEdge);

    let first = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();
    let second = probe_host("localhost", addr.port(), PROBE_TIMEOUT, &bundle)
        .await
        .unwrap();

    assert_eq!(first.authorized, second.authorized);
    assert_eq!(first.failure, second.failure);
    assert_eq!(first.peer_chain, second.peer_chain);
    assert_eq!(
        trustscan_core::normalize_chain(&first.peer_chain),
        trustscan_core::normalize_chain(&second.peer_chain)
    );
}

fn evaluator_for(ca: &TestCa) -> Evaluator {
    let bundles = Vendor::ALL.iter().map(|v| ca.bundle(*v)).collect();
    Evaluator::new(bundles).with_timeout(PROBE_TIMEOUT)
}

#[tokio::test]
async fn test_evaluate_target_joins_all_vendors() {
    let ca = TestCa::new("Join CA");
    let (chain, key) = ca.issue(&["localhost"], None);
    let addr = spawn_tls_server(chain, key).await;

    let evaluator = evaluator_for(&ca);
    let evaluation = evaluator
        .evaluate_target(&Target::new("localhost", addr.port()))
        .await
        .unwrap();

    assert!(evaluation.tls_reachable);
    assert_eq!(evaluation.results.len(), 3);
    for result in &evaluation.results {
        assert_eq!(result.score.score, SCORE_TRUSTED);
        assert_eq!(result.score.vendor, result.vendor);
        let chain_eval = result.evaluation.as_ref().unwrap();
        assert!(chain_eval.authorized);
        assert_eq!(chain_eval.chain.len(), 2);
    }
}

#[tokio::test]
async fn test_evaluate_target_plaintext_scores_one_per_vendor() {
    let ca = TestCa::new("Plain Join CA");
    let addr = spawn_plaintext_server().await;

    let evaluator = evaluator_for(&ca);
    let evaluation = evaluator
        .evaluate_target(&Target::new("localhost", addr.port()))
        .await
        .unwrap();

    assert!(!evaluation.tls_reachable);
    assert_eq!(evaluation.results.len(), 3);
    for result in &evaluation.results {
        assert_eq!(result.score.score, SCORE_PLAINTEXT);
        assert!(result.evaluation.is_none());
    }
}

#[tokio::test]
async fn test_batch_partial_failure_keeps_reachable_targets() {
    let ca = TestCa::new("Batch CA");
    let (chain_a, key_a) = ca.issue(&["localhost"], None);
    let (chain_b, key_b) = ca.issue(&["localhost"], None);
    let addr_a = spawn_tls_server(chain_a, key_a).await;
    let addr_b = spawn_tls_server(chain_b, key_b).await;
    let dead_port = refused_port().await;

    let evaluator = evaluator_for(&ca);
    let targets = vec![
        Target::new("localhost", addr_a.port()),
        Target::new("127.0.0.1", dead_port),
        Target::new("localhost", addr_b.port()),
    ];
    let batch = evaluator.evaluate_batch(&targets).await;

    assert_eq!(batch.evaluated_count, 2);
    assert!(batch.had_errors);
    assert_eq!(batch.evaluated.len(), 2);
    for evaluation in &batch.evaluated {
        assert_eq!(evaluation.results.len(), 3);
        assert!(evaluation.tls_reachable);
    }
}

#[tokio::test]
async fn test_not_yet_valid_leaf_drops_target_as_unrecognized() {
    let ca = TestCa::new("Future CA");
    let window = (
        rcgen::date_time_ymd(2999, 1, 1),
        rcgen::date_time_ymd(3000, 1, 1),
    );
    let (chain, key) = ca.issue(&["localhost"], Some(window));
    let addr = spawn_tls_server(chain, key).await;

    let evaluator = evaluator_for(&ca);
    let batch = evaluator
        .evaluate_batch(&[Target::new("localhost", addr.port())])
        .await;

    // A validation failure outside the recognized set is surfaced, never
    // silently scored.
    assert_eq!(batch.evaluated_count, 0);
    assert!(batch.had_errors);
}
