use thiserror::Error;

use crate::store::Vendor;

/// Errors produced by the evaluation engine.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A trust-store bundle contained no decodable certificate blocks.
    #[error("trust store parse error: {0}")]
    Parse(String),

    /// Connection-level probe failure; never carries a chain.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The TLS stack reported a validation failure the engine does not
    /// recognize. Surfaced as an error instead of being scored.
    #[error("unrecognized validation failure reported by {0} probe")]
    UnrecognizedValidation(Vendor),

    /// A certificate could not be decoded into its metadata.
    #[error("certificate decode error: {0}")]
    CertDecode(String),
}

/// Connection-level probe failures. None of these produce a chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("connection attempt timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("dns resolution failed: {0}")]
    DnsFailure(String),

    /// The peer answered with something other than TLS on the probed port.
    #[error("peer does not speak TLS on the probed port")]
    ProtocolMismatch,

    /// Any other socket-level failure (reset, unreachable, handshake I/O).
    #[error("connection failed: {0}")]
    Connection(String),
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
