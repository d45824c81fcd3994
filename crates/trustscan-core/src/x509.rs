//! Shared X.509 decoding helpers used by the store loader and the chain
//! normalizer.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use der::{Decode, Encode};
use time::OffsetDateTime;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::error::{Result, ScanError};

pub(crate) fn decode(der_bytes: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der_bytes).map_err(|e| ScanError::CertDecode(e.to_string()))
}

/// Canonical DER encoding of a distinguished name, used for issuer/subject
/// identity comparison.
pub(crate) fn name_der(name: &x509_cert::name::Name) -> Option<Vec<u8>> {
    name.to_der().ok()
}

pub(crate) fn is_self_issued(cert: &Certificate) -> bool {
    match (
        name_der(&cert.tbs_certificate.subject),
        name_der(&cert.tbs_certificate.issuer),
    ) {
        (Some(subject), Some(issuer)) => subject == issuer,
        _ => false,
    }
}

pub(crate) fn validity_window(cert: &Certificate) -> Result<(OffsetDateTime, OffsetDateTime)> {
    let validity = &cert.tbs_certificate.validity;
    Ok((
        to_offset(&validity.not_before)?,
        to_offset(&validity.not_after)?,
    ))
}

fn to_offset(t: &x509_cert::time::Time) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(t.to_unix_duration().as_secs() as i64)
        .map_err(|e| ScanError::CertDecode(format!("certificate validity out of range: {e}")))
}

/// Base64 of the DER-encoded subject public key info.
pub(crate) fn spki_base64(cert: &Certificate) -> Result<String> {
    let der_bytes = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| ScanError::CertDecode(e.to_string()))?;
    Ok(STANDARD.encode(der_bytes))
}

/// PEM encoding of a DER certificate body, wrapped at 64 columns.
pub(crate) fn pem_encode(der_bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(der_bytes);
    let mut pem = String::with_capacity(b64.len() + b64.len() / 64 + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    let mut i = 0;
    while i < b64.len() {
        let end = usize::min(i + 64, b64.len());
        pem.push_str(&b64[i..end]);
        pem.push('\n');
        i = end;
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

/// Key algorithm name and key size in bits, derived from the SPKI.
pub(crate) fn key_info(spki: &SubjectPublicKeyInfoOwned) -> (String, Option<u32>) {
    use const_oid::db::{rfc5912, rfc8410};

    let oid = spki.algorithm.oid;
    if oid == rfc5912::RSA_ENCRYPTION {
        let bits = rsa_modulus_bits(spki.subject_public_key.raw_bytes());
        ("RSA".to_string(), bits)
    } else if oid == rfc5912::ID_EC_PUBLIC_KEY {
        let curve = spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|p| p.decode_as::<const_oid::ObjectIdentifier>().ok());
        let bits = curve.and_then(|c| {
            if c == rfc5912::SECP_256_R_1 {
                Some(256)
            } else if c == rfc5912::SECP_384_R_1 {
                Some(384)
            } else if c == rfc5912::SECP_521_R_1 {
                Some(521)
            } else {
                None
            }
        });
        ("EC".to_string(), bits)
    } else if oid == rfc8410::ID_ED_25519 {
        ("Ed25519".to_string(), Some(256))
    } else {
        (oid.to_string(), None)
    }
}

fn rsa_modulus_bits(raw: &[u8]) -> Option<u32> {
    let key = pkcs1::RsaPublicKey::from_der(raw).ok()?;
    Some((key.modulus.as_bytes().len() * 8) as u32)
}
