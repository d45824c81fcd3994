//! Trust classification: a pure mapping from probe outcomes to scores.

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result, ScanError};
use crate::probe::ValidationFailure;
use crate::store::Vendor;

/// Chain validated against the vendor store.
pub const SCORE_TRUSTED: u8 = 3;
/// Chain present but untrusted for a recognized reason.
pub const SCORE_UNTRUSTED: u8 = 2;
/// Host reachable over unencrypted transport only.
pub const SCORE_PLAINTEXT: u8 = 1;

/// Trust level granted by one vendor store. Scores live in {0,1,2,3};
/// 0 is part of the domain but the classifier never emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScore {
    pub vendor: Vendor,
    pub score: u8,
}

/// Score a completed handshake for one vendor.
///
/// An unrecognized validation failure is a hard error, not a score: unknown
/// failure modes stay visible instead of being masked by a guessed number.
pub fn score_handshake(
    vendor: Vendor,
    authorized: bool,
    failure: Option<ValidationFailure>,
) -> Result<TrustScore> {
    if authorized {
        return Ok(TrustScore {
            vendor,
            score: SCORE_TRUSTED,
        });
    }
    match failure {
        Some(ValidationFailure::Unrecognized) | None => {
            Err(ScanError::UnrecognizedValidation(vendor))
        }
        Some(_) => Ok(TrustScore {
            vendor,
            score: SCORE_UNTRUSTED,
        }),
    }
}

/// Score a connection-level failure, when it is scoreable at all.
///
/// Only a plaintext peer maps to a score; every other connection failure
/// propagates as a typed error for the orchestrator to surface.
pub fn score_connection(vendor: Vendor, error: &ProbeError) -> Option<TrustScore> {
    match error {
        ProbeError::ProtocolMismatch => Some(TrustScore {
            vendor,
            score: SCORE_PLAINTEXT,
        }),
        _ => None,
    }
}
