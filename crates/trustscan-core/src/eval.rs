//! Multi-vendor orchestration: fan out one probe per vendor for each target,
//! join per host, aggregate per batch.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::chain::{normalize_chain, CertificateRecord};
use crate::error::{ProbeError, Result, ScanError};
use crate::probe::{probe_host, ProbeOutcome, ValidationFailure, DEFAULT_TIMEOUT};
use crate::score::{score_connection, score_handshake, TrustScore};
use crate::store::{TrustAnchorBundle, Vendor};

/// Default cap on concurrent target evaluations within one batch.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Upper bound on targets per batch.
pub const MAX_BATCH_TARGETS: usize = 100;

/// One evaluation target, already normalized upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Outcome of validating one host's chain against one vendor store.
///
/// When `authorized` is true the failure is always absent; the chain is
/// present either way, because the handshake completes even on validation
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEvaluation {
    pub vendor: Vendor,
    pub chain: Vec<CertificateRecord>,
    pub authorized: bool,
    pub failure: Option<ValidationFailure>,
}

/// Per-vendor slice of a host evaluation. `evaluation` is absent only for
/// the plaintext-reachability case, which carries no chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorTrust {
    pub vendor: Vendor,
    pub evaluation: Option<ChainEvaluation>,
    pub score: TrustScore,
}

/// Complete evaluation of one target across every configured vendor.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEvaluation {
    pub host: String,
    pub port: u16,
    pub tls_reachable: bool,
    pub results: Vec<VendorTrust>,
}

/// Transient summary of one batch run; never persisted.
#[derive(Debug)]
pub struct EvaluationBatch {
    pub requested: Vec<Target>,
    pub evaluated: Vec<HostEvaluation>,
    pub evaluated_count: usize,
    pub had_errors: bool,
}

/// Engine entry point.
///
/// Owns the vendor bundles, which are loaded once and shared read-only with
/// every probe for the lifetime of the process.
pub struct Evaluator {
    bundles: Vec<Arc<TrustAnchorBundle>>,
    timeout: Duration,
    concurrency: usize,
}

impl Evaluator {
    pub fn new(bundles: Vec<Arc<TrustAnchorBundle>>) -> Self {
        Self {
            bundles,
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn bundles(&self) -> &[Arc<TrustAnchorBundle>] {
        &self.bundles
    }

    pub fn vendors(&self) -> impl Iterator<Item = Vendor> + '_ {
        self.bundles.iter().map(|b| b.vendor)
    }

    /// Evaluate a batch of targets.
    ///
    /// A hard failure on one target drops that target from the result set and
    /// raises the batch error flag; evaluation of the remaining targets is
    /// never aborted. Validation of the batch size (1 to
    /// [`MAX_BATCH_TARGETS`] targets) happens upstream.
    pub async fn evaluate_batch(&self, targets: &[Target]) -> EvaluationBatch {
        let probes = targets
            .iter()
            .cloned()
            .map(|target| async move { self.evaluate_target(&target).await });
        let results: Vec<Result<HostEvaluation>> = stream::iter(probes)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut evaluated = Vec::with_capacity(results.len());
        let mut had_errors = false;
        for result in results {
            match result {
                Ok(evaluation) => evaluated.push(evaluation),
                Err(err) => {
                    tracing::warn!("target dropped from batch: {err}");
                    had_errors = true;
                }
            }
        }
        EvaluationBatch {
            requested: targets.to_vec(),
            evaluated_count: evaluated.len(),
            evaluated,
            had_errors,
        }
    }

    /// Evaluate one target against every vendor bundle.
    ///
    /// The per-vendor probes run concurrently and settle independently; a
    /// failure in one never cancels its siblings. The results are joined into
    /// one [`HostEvaluation`] only after all probes have settled.
    pub async fn evaluate_target(&self, target: &Target) -> Result<HostEvaluation> {
        let probes = self.bundles.iter().map(|bundle| async move {
            let outcome = probe_host(&target.host, target.port, self.timeout, bundle).await;
            (bundle.vendor, outcome)
        });
        let outcomes: Vec<(Vendor, std::result::Result<ProbeOutcome, ProbeError>)> =
            futures::future::join_all(probes).await;

        // A hard connection failure on any vendor takes the whole target out
        // of the batch; a partially-filled evaluation is never returned.
        for (vendor, outcome) in &outcomes {
            if let Err(err) = outcome {
                if score_connection(*vendor, err).is_none() {
                    tracing::debug!(host = %target.host, %vendor, "probe failed: {err}");
                    return Err(ScanError::Probe(err.clone()));
                }
            }
        }

        let mut tls_reachable = true;
        let mut results = Vec::with_capacity(outcomes.len());
        for (vendor, outcome) in outcomes {
            match outcome {
                Ok(probe) => {
                    let score = score_handshake(vendor, probe.authorized, probe.failure)?;
                    let chain = normalize_chain(&probe.peer_chain);
                    results.push(VendorTrust {
                        vendor,
                        evaluation: Some(ChainEvaluation {
                            vendor,
                            chain,
                            authorized: probe.authorized,
                            failure: probe.failure,
                        }),
                        score,
                    });
                }
                Err(err) => {
                    // Only the plaintext case reaches here; it is scoreable
                    // but carries no chain.
                    let Some(score) = score_connection(vendor, &err) else {
                        return Err(ScanError::Probe(err));
                    };
                    tls_reachable = false;
                    results.push(VendorTrust {
                        vendor,
                        evaluation: None,
                        score,
                    });
                }
            }
        }

        Ok(HostEvaluation {
            host: target.host.clone(),
            port: target.port,
            tls_reachable,
            results,
        })
    }
}
