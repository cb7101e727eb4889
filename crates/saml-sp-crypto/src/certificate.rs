//! Certificate and private key decoding.
//!
//! IdP certificates arrive either as full PEM documents or as the bare
//! base64 body copied out of IdP metadata; both forms are accepted.

use std::fmt;

use aws_lc_rs::signature::RsaKeyPair;
use base64::Engine;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::signature::SignatureError;

/// RSA modulus sizes accepted for verification, in bits.
pub const RSA_KEY_BITS: std::ops::RangeInclusive<usize> = 2048..=8192;

/// Extracts the DER bytes from the first PEM block with the given label.
///
/// Returns `None` when the block is absent or its body is not valid base64.
#[must_use]
pub fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let end_pos = start + pem[start..].find(&end)?;

    decode_base64_body(&pem[start..end_pos])
}

fn decode_base64_body(body: &str) -> Option<Vec<u8>> {
    let b64_data: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(b64_data).ok()
}

/// An X.509 certificate used as a signature trust anchor.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    rsa_public_key: Vec<u8>,
}

impl Certificate {
    /// Parses a DER-encoded certificate carrying an RSA public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the DER is not a certificate, the key is not
    /// RSA, or the modulus size is outside [`RSA_KEY_BITS`], the range
    /// [`crate::rsa_verify`] accepts.
    pub fn from_der(der: Vec<u8>) -> Result<Self, SignatureError> {
        let (subject, rsa_public_key) = {
            let (_, cert) = X509Certificate::from_der(&der).map_err(|e| {
                SignatureError::InvalidCertificate(format!("Failed to parse certificate: {e}"))
            })?;

            let spki = cert.public_key();
            let Ok(PublicKey::RSA(rsa)) = spki.parsed() else {
                return Err(SignatureError::InvalidCertificate(
                    "certificate does not carry an RSA public key".to_string(),
                ));
            };
            let bits = rsa.key_size();
            if !RSA_KEY_BITS.contains(&bits) {
                return Err(SignatureError::InvalidCertificate(format!(
                    "{bits}-bit RSA key is outside the supported {}..={} bits",
                    RSA_KEY_BITS.start(),
                    RSA_KEY_BITS.end()
                )));
            }

            (
                cert.subject().to_string(),
                spki.subject_public_key.data.to_vec(),
            )
        };

        Ok(Self {
            der,
            subject,
            rsa_public_key,
        })
    }

    /// Parses a PEM certificate, or a bare base64 DER body.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be decoded or parsed.
    pub fn from_pem_or_base64(input: &str) -> Result<Self, SignatureError> {
        let der = if input.contains("-----BEGIN CERTIFICATE-----") {
            pem_to_der(input, "CERTIFICATE")
        } else {
            decode_base64_body(input)
        }
        .ok_or_else(|| SignatureError::InvalidCertificate("Invalid certificate encoding".to_string()))?;

        Self::from_der(der)
    }

    /// Returns the DER encoding of the certificate.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the public key as a PKCS#1 `RSAPublicKey` DER structure.
    #[must_use]
    pub fn rsa_public_key(&self) -> &[u8] {
        &self.rsa_public_key
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// An RSA private key.
#[derive(Clone)]
pub struct PrivateKey {
    der: Vec<u8>,
}

impl PrivateKey {
    /// Parses a PEM private key (PKCS#8 `PRIVATE KEY` or PKCS#1 `RSA PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is malformed or not an RSA key.
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let der = pem_to_der(pem, "PRIVATE KEY")
            .or_else(|| pem_to_der(pem, "RSA PRIVATE KEY"))
            .ok_or_else(|| SignatureError::InvalidKey("Invalid private key PEM".to_string()))?;

        RsaKeyPair::from_pkcs8(&der)
            .or_else(|_| RsaKeyPair::from_der(&der))
            .map_err(|e| SignatureError::InvalidKey(format!("Invalid RSA key: {e}")))?;

        Ok(Self { der })
    }

    /// Returns the DER encoding of the key.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}
