//! Cryptographically secure random generation.
//!
//! SAML message identifiers must be unpredictable: a guessable request ID
//! lets an attacker pre-compute responses bound to it. Everything here reads
//! from the thread-local CSPRNG.

use std::fmt::Write;

use rand::Rng;

/// Number of random bytes behind a request identifier (20 hex characters).
const REQUEST_ID_BYTES: usize = 10;

/// Generates a cryptographically secure random byte array.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates `byte_len` random bytes and renders them as lowercase hex.
///
/// The result is `2 * byte_len` characters long.
#[must_use]
pub fn random_hex(byte_len: usize) -> String {
    random_bytes(byte_len)
        .iter()
        .fold(String::with_capacity(byte_len * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

/// Generates a SAML request identifier.
///
/// The identifier is an underscore followed by 20 lowercase hex characters.
/// The leading underscore keeps it a valid `xs:ID` (which cannot start with
/// a digit).
#[must_use]
pub fn generate_request_id() -> String {
    format!("_{}", random_hex(REQUEST_ID_BYTES))
}
