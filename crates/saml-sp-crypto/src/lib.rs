//! # saml-sp-crypto
//!
//! Cryptographic primitives used by the SAML service provider, built on
//! aws-lc-rs.
//!
//! ## Algorithms
//!
//! - Digests: SHA-256, SHA-384, SHA-512 (SHA-1 only for verifying legacy IdPs)
//! - Signatures: RSA PKCS#1 v1.5, 2048 to 8192 bit keys
//! - Identifiers: CSPRNG-backed request IDs

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod certificate;
pub mod hash;
pub mod random;
pub mod signature;

pub use algorithm::{HashAlgorithm, RsaAlgorithm};
pub use certificate::{pem_to_der, Certificate, PrivateKey};
pub use hash::{digest, sha256};
pub use random::{generate_request_id, random_bytes, random_hex};
pub use signature::{rsa_sign, rsa_verify, SignatureError};
