//! RSA PKCS#1 v1.5 signing and verification.
//!
//! SAML deployments overwhelmingly sign with RSA PKCS#1 v1.5, both for
//! enveloped XML signatures and for the detached signature of the
//! HTTP-Redirect binding.

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, RsaKeyPair, UnparsedPublicKey},
};
use thiserror::Error;

use crate::algorithm::RsaAlgorithm;

/// Error type for signature operations.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Verification failed.
    #[error("signature verification failed")]
    Verification,

    /// Invalid key format.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Invalid certificate.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Algorithm not supported.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),
}

/// Signs data with an RSA private key.
///
/// # Arguments
///
/// * `key_der` - RSA private key in DER format (PKCS#1 or PKCS#8)
/// * `data` - Data to sign
/// * `algorithm` - Signature algorithm
///
/// # Errors
///
/// Returns an error if the key cannot be parsed, the algorithm is
/// verification-only, or signing fails.
pub fn rsa_sign(
    key_der: &[u8],
    data: &[u8],
    algorithm: RsaAlgorithm,
) -> Result<Vec<u8>, SignatureError> {
    let padding: &'static dyn signature::RsaEncoding = match algorithm {
        RsaAlgorithm::Rs1 => {
            return Err(SignatureError::UnsupportedAlgorithm(
                "RSA-SHA1 is accepted for verification only".to_string(),
            ))
        }
        RsaAlgorithm::Rs256 => &signature::RSA_PKCS1_SHA256,
        RsaAlgorithm::Rs384 => &signature::RSA_PKCS1_SHA384,
        RsaAlgorithm::Rs512 => &signature::RSA_PKCS1_SHA512,
    };

    let key_pair = RsaKeyPair::from_der(key_der)
        .or_else(|_| RsaKeyPair::from_pkcs8(key_der))
        .map_err(|e| SignatureError::InvalidKey(format!("Invalid RSA key: {e}")))?;

    let rng = SystemRandom::new();
    let mut sig = vec![0u8; key_pair.public_modulus_len()];

    key_pair
        .sign(padding, &rng, data, &mut sig)
        .map_err(|e| SignatureError::Signing(format!("RSA signing failed: {e}")))?;

    Ok(sig)
}

/// Verifies an RSA signature.
///
/// Returns `Ok(false)` when the signature does not match; a mismatch is an
/// expected outcome for untrusted input, not an error. Keys outside
/// 2048 to 8192 bits also give `Ok(false)`; [`crate::Certificate::from_der`]
/// refuses them up front.
///
/// # Arguments
///
/// * `public_key_der` - RSA public key as a DER `RSAPublicKey` (PKCS#1)
/// * `data` - Original data that was signed
/// * `sig` - Signature to verify
/// * `algorithm` - Signature algorithm
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for key parsing errors.
pub fn rsa_verify(
    public_key_der: &[u8],
    data: &[u8],
    sig: &[u8],
    algorithm: RsaAlgorithm,
) -> Result<bool, SignatureError> {
    let verification_alg: &'static dyn signature::VerificationAlgorithm = match algorithm {
        RsaAlgorithm::Rs1 => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        RsaAlgorithm::Rs256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        RsaAlgorithm::Rs384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        RsaAlgorithm::Rs512 => &signature::RSA_PKCS1_2048_8192_SHA512,
    };

    let public_key = UnparsedPublicKey::new(verification_alg, public_key_der);

    match public_key.verify(data, sig) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
