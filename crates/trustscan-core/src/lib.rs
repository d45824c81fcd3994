//! Trustscan evaluation engine.
//!
//! Evaluates whether a host's TLS certificate chain is trusted by each of
//! several browser vendor root stores, producing a per-vendor trust verdict
//! and a normalized, replayable representation of the chain the host
//! presented.

pub mod chain;
pub mod error;
pub mod eval;
pub mod probe;
pub mod score;
pub mod store;
mod x509;

pub use chain::{normalize_chain, CertificateRecord};
pub use error::{ProbeError, Result, ScanError};
pub use eval::{
    ChainEvaluation, EvaluationBatch, Evaluator, HostEvaluation, Target, VendorTrust,
    DEFAULT_CONCURRENCY, MAX_BATCH_TARGETS,
};
pub use probe::{probe_host, ProbeOutcome, ValidationFailure, DEFAULT_TIMEOUT};
pub use score::{
    score_connection, score_handshake, TrustScore, SCORE_PLAINTEXT, SCORE_TRUSTED,
    SCORE_UNTRUSTED,
};
pub use store::{load_bundle, RootCertInfo, TrustAnchorBundle, TrustStoreCatalog, Vendor};
