//! Chain normalization: converts the raw peer chain from one handshake into
//! a finite, ordered, serializable sequence of certificate records.

use std::collections::HashSet;

use rustls::pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_cert::Certificate;

use crate::error::Result;
use crate::x509;

/// One certificate in a normalized chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub subject: String,
    pub issuer: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    /// PEM-encoded certificate body, wrapped at 64 columns.
    pub pem: String,
    /// Base64 of the DER-encoded subject public key info.
    pub public_key: String,
}

/// Walk the presented chain from the leaf, following issuer links.
///
/// Each step looks up the certificate whose subject matches the current
/// issuer. The walk stops when the link is absent, does not decode, or has
/// already been visited; the visited set is what terminates a self-signed
/// root and bounds a looping chain, so the output length never exceeds the
/// number of distinct certificates observed in the handshake.
pub fn normalize_chain(peer_chain: &[CertificateDer<'_>]) -> Vec<CertificateRecord> {
    let parsed: Vec<Option<Certificate>> = peer_chain
        .iter()
        .map(|der| x509::decode(der.as_ref()).ok())
        .collect();

    let mut records = Vec::new();
    let mut visited: HashSet<[u8; 32]> = HashSet::new();

    let mut current = if peer_chain.is_empty() { None } else { Some(0) };
    while let Some(index) = current {
        let Some(cert) = &parsed[index] else { break };
        if !visited.insert(fingerprint(peer_chain[index].as_ref())) {
            break;
        }
        match to_record(peer_chain[index].as_ref(), cert) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!("dropping undecodable chain link: {e}");
                break;
            }
        }

        let Some(issuer) = x509::name_der(&cert.tbs_certificate.issuer) else {
            break;
        };
        current = parsed.iter().position(|candidate| {
            candidate
                .as_ref()
                .and_then(|c| x509::name_der(&c.tbs_certificate.subject))
                .is_some_and(|subject| subject == issuer)
        });
    }

    records
}

fn to_record(der_bytes: &[u8], cert: &Certificate) -> Result<CertificateRecord> {
    let tbs = &cert.tbs_certificate;
    let (not_before, not_after) = x509::validity_window(cert)?;
    Ok(CertificateRecord {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        not_before,
        not_after,
        pem: x509::pem_encode(der_bytes),
        public_key: x509::spki_base64(cert)?,
    })
}

fn fingerprint(der_bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(der_bytes).into()
}
