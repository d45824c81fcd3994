//! Process-wide engine state.
//!
//! The vendor bundles are loaded once at startup and shared read-only with
//! every request for the lifetime of the process.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use trustscan_core::{load_bundle, Evaluator, Vendor};

use crate::error::{AppError, Result};
use crate::settings::TrustCfg;

static TRUST_CFG: OnceLock<TrustCfg> = OnceLock::new();
static EVALUATOR: OnceLock<Arc<Evaluator>> = OnceLock::new();

/// Load every vendor bundle and build the shared evaluator.
pub fn init(cfg: &TrustCfg) -> Result<()> {
    let _ = TRUST_CFG.set(cfg.clone());

    let mut bundles = Vec::with_capacity(Vendor::ALL.len());
    for vendor in Vendor::ALL {
        let path = cfg.bundle_path(vendor);
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::Internal(format!("failed to read {path}: {e}")))?;
        bundles.push(Arc::new(load_bundle(vendor, &bytes)?));
    }

    let evaluator = Evaluator::new(bundles)
        .with_timeout(Duration::from_millis(cfg.probe_timeout_ms))
        .with_concurrency(cfg.max_concurrent_probes);
    let _ = EVALUATOR.set(Arc::new(evaluator));
    Ok(())
}

pub fn evaluator() -> Result<Arc<Evaluator>> {
    EVALUATOR
        .get()
        .cloned()
        .ok_or_else(|| AppError::Unavailable("trust stores are not loaded".to_string()))
}

pub fn trust_cfg() -> Result<&'static TrustCfg> {
    TRUST_CFG
        .get()
        .ok_or_else(|| AppError::Unavailable("service configuration is not initialized".to_string()))
}
