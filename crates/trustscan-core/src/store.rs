//! Root store loading: parses a vendor's PEM bundle into the trust-anchor
//! set handed to the prober and the metadata catalog used for browsing.

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Result, ScanError};
use crate::x509;

/// Browser vendors whose root bundles the engine evaluates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    #[serde(rename = "Google Chrome")]
    GoogleChrome,
    #[serde(rename = "Mozilla Firefox")]
    MozillaFirefox,
    #[serde(rename = "Microsoft Edge")]
    MicrosoftEdge,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [
        Vendor::GoogleChrome,
        Vendor::MozillaFirefox,
        Vendor::MicrosoftEdge,
    ];

    /// Human-readable label, as rendered by the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Vendor::GoogleChrome => "Google Chrome",
            Vendor::MozillaFirefox => "Mozilla Firefox",
            Vendor::MicrosoftEdge => "Microsoft Edge",
        }
    }

    /// Stable identifier used in storage keys and URLs.
    pub fn slug(&self) -> &'static str {
        match self {
            Vendor::GoogleChrome => "google-chrome",
            Vendor::MozillaFirefox => "mozilla-firefox",
            Vendor::MicrosoftEdge => "microsoft-edge",
        }
    }

    /// Accepts the display label, the slug, or the bundle's short alias.
    pub fn parse(name: &str) -> Option<Vendor> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "google chrome" | "google-chrome" | "chrome" | "chromium" => Some(Vendor::GoogleChrome),
            "mozilla firefox" | "mozilla-firefox" | "firefox" | "mozilla" => {
                Some(Vendor::MozillaFirefox)
            }
            "microsoft edge" | "microsoft-edge" | "edge" | "msft" => Some(Vendor::MicrosoftEdge),
            _ => None,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata for one parsed root certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCertInfo {
    pub subject: String,
    pub issuer: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    pub key_algorithm: String,
    pub key_size: Option<u32>,
}

/// One vendor's root bundle.
///
/// Loaded once, then shared read-only across every probe for that vendor for
/// the lifetime of the process.
#[derive(Debug)]
pub struct TrustAnchorBundle {
    pub vendor: Vendor,
    pub roots: Arc<RootCertStore>,
    pub certificates: Vec<RootCertInfo>,
}

impl TrustAnchorBundle {
    /// Number of certificates decoded from the bundle.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Snapshot for the browsable trust-store catalog.
    pub fn catalog(&self) -> TrustStoreCatalog {
        TrustStoreCatalog {
            vendor: self.vendor,
            total: self.certificates.len(),
            certificates: self.certificates.clone(),
        }
    }
}

/// Browsable view of one vendor's root store, independent of any host probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustStoreCatalog {
    pub vendor: Vendor,
    pub total: usize,
    pub certificates: Vec<RootCertInfo>,
}

/// Parse a PEM bundle into a vendor trust-anchor bundle.
///
/// Scans for `BEGIN CERTIFICATE`/`END CERTIFICATE` blocks, tolerating blank
/// lines and CRLF endings. Fails with a parse error when the input contains
/// zero decodable blocks.
pub fn load_bundle(vendor: Vendor, bytes: &[u8]) -> Result<TrustAnchorBundle> {
    let mut reader = bytes;
    let mut ders: Vec<CertificateDer<'static>> = Vec::new();
    for block in rustls_pemfile::certs(&mut reader) {
        match block {
            Ok(der) => ders.push(der),
            Err(e) => {
                tracing::debug!(%vendor, "skipping undecodable bundle block: {e}");
            }
        }
    }
    if ders.is_empty() {
        return Err(ScanError::Parse(format!(
            "{vendor} bundle contains no certificate blocks"
        )));
    }

    let mut roots = RootCertStore::empty();
    let mut certificates = Vec::with_capacity(ders.len());
    for der in &ders {
        certificates.push(cert_metadata(der)?);
        if let Err(e) = roots.add(der.clone()) {
            tracing::warn!(%vendor, "root rejected by trust anchor store: {e}");
        }
    }
    if roots.is_empty() {
        return Err(ScanError::Parse(format!(
            "{vendor} bundle contains no usable trust anchors"
        )));
    }

    tracing::info!(%vendor, count = certificates.len(), "loaded trust store bundle");
    Ok(TrustAnchorBundle {
        vendor,
        roots: Arc::new(roots),
        certificates,
    })
}

fn cert_metadata(der: &CertificateDer<'_>) -> Result<RootCertInfo> {
    let cert = x509::decode(der.as_ref())?;
    let tbs = &cert.tbs_certificate;
    let (not_before, not_after) = x509::validity_window(&cert)?;
    let (key_algorithm, key_size) = x509::key_info(&tbs.subject_public_key_info);
    Ok(RootCertInfo {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        not_before,
        not_after,
        key_algorithm,
        key_size,
    })
}
