//! Evaluation request/response models and target-string normalization.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use trustscan_core::{HostEvaluation, Target, VendorTrust};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, Result};

/// Hostname shape accepted at the request boundary: dot-separated labels of
/// letters, digits and inner hyphens. Also matches IPv4 literals.
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)*[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$")
        .expect("hostname regex is valid")
});

/// Batch evaluation request: 1–100 host or URL strings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 100))]
    pub targets: Vec<String>,
}

/// Batch evaluation summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluateResponse {
    pub evaluated_count: usize,
    pub had_errors: bool,
}

/// Response for clearing stored evaluations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: usize,
}

/// Stored host evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationRecord {
    pub host: String,
    pub port: u16,
    /// Whether the host completed a TLS handshake at all.
    pub tls: bool,
    /// Per-vendor chain and trust score.
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<VendorTrust>,
    pub created_at: i64,
}

impl EvaluationRecord {
    pub fn from_evaluation(evaluation: HostEvaluation) -> Self {
        Self {
            host: evaluation.host,
            port: evaluation.port,
            tls: evaluation.tls_reachable,
            results: evaluation.results,
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

/// Normalize one raw target string into a probe target.
///
/// Accepts bare hostnames, `host:port`, and `https://`/`http://` URLs; the
/// port defaults to 443 when absent.
pub fn parse_target(raw: &str) -> Result<Target> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_path = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let (host, port) = match without_path.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| AppError::BadRequest(format!("invalid port in target: {raw}")))?;
            (host, port)
        }
        _ => (without_path, 443),
    };

    let host = host.to_ascii_lowercase();
    if host.is_empty() || !HOSTNAME_RE.is_match(&host) {
        return Err(AppError::BadRequest(format!("invalid host: {raw}")));
    }
    Ok(Target::new(host, port))
}
