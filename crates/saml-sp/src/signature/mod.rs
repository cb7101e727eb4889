//! XML Signature support.
//!
//! Response trust rests on enveloped XML-DSig signatures over exclusive
//! C14N, RSA PKCS#1 v1.5 with SHA-256, SHA-384 or SHA-512. SHA-1 is
//! recognized so it can be refused with a clear error, and accepted only
//! when explicitly enabled.
//!
//! [`SignatureVerifier`] is the seam the response validator calls into;
//! [`XmlSignatureValidator`] is the implementation used by default.

mod signer;
mod validator;

pub use signer::*;
pub use validator::*;

use saml_sp_crypto::{Certificate, HashAlgorithm, RsaAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::SamlResult;
use crate::types::{digest_algorithms, signature_algorithms, transform_algorithms};
use crate::xml::{NodeId, XmlDocument};

/// Checks the signature carried by one element of a parsed document.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies the enveloped signature that is a direct child of `element`.
    ///
    /// Returns `Ok(true)` when the signature covers `element` and verifies
    /// against `anchor`, and `Ok(false)` when `element` carries no signature.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SamlError::SignatureInvalid`] when a signature is
    /// present but malformed, does not cover `element`, or fails to verify.
    fn verify_element(
        &self,
        doc: &XmlDocument,
        element: NodeId,
        anchor: &Certificate,
    ) -> SamlResult<bool>;
}

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    #[default]
    #[serde(rename = "rsa-sha256")]
    RsaSha256,
    /// RSA with SHA-384.
    #[serde(rename = "rsa-sha384")]
    RsaSha384,
    /// RSA with SHA-512.
    #[serde(rename = "rsa-sha512")]
    RsaSha512,
    /// Legacy RSA with SHA-1.
    #[serde(rename = "rsa-sha1")]
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Returns the digest algorithm conventionally paired with this one.
    #[must_use]
    pub const fn digest(&self) -> DigestAlgorithm {
        match self {
            Self::RsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 => DigestAlgorithm::Sha512,
            Self::RsaSha1 => DigestAlgorithm::Sha1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns the RSA primitive behind this algorithm.
    #[must_use]
    pub const fn rsa(&self) -> RsaAlgorithm {
        match self {
            Self::RsaSha256 => RsaAlgorithm::Rs256,
            Self::RsaSha384 => RsaAlgorithm::Rs384,
            Self::RsaSha512 => RsaAlgorithm::Rs512,
            Self::RsaSha1 => RsaAlgorithm::Rs1,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

/// Reference digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// Legacy SHA-1.
    Sha1,
}

impl DigestAlgorithm {
    /// Returns the URI for this digest algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Sha256 => digest_algorithms::SHA256,
            Self::Sha384 => digest_algorithms::SHA384,
            Self::Sha512 => digest_algorithms::SHA512,
            Self::Sha1 => digest_algorithms::SHA1,
        }
    }

    /// Parses a digest algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            digest_algorithms::SHA256 => Some(Self::Sha256),
            digest_algorithms::SHA384 => Some(Self::Sha384),
            digest_algorithms::SHA512 => Some(Self::Sha512),
            digest_algorithms::SHA1 => Some(Self::Sha1),
            _ => None,
        }
    }

    /// Returns the hash function behind this algorithm.
    #[must_use]
    pub const fn hash(&self) -> HashAlgorithm {
        match self {
            Self::Sha256 => HashAlgorithm::Sha256,
            Self::Sha384 => HashAlgorithm::Sha384,
            Self::Sha512 => HashAlgorithm::Sha512,
            Self::Sha1 => HashAlgorithm::Sha1,
        }
    }

    /// Returns true if this algorithm is SHA-1.
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::Sha1)
    }
}

/// Canonicalization algorithm selection. Only exclusive C14N is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments.
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => transform_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => transform_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            transform_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            transform_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            _ => None,
        }
    }

    /// Returns true if comments are kept.
    #[must_use]
    pub const fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveC14NWithComments)
    }
}

/// The parts of a `<ds:Signature>` element needed to check it.
#[derive(Debug, Clone)]
pub struct XmlSignature {
    /// The signature element itself.
    pub node: NodeId,
    /// The `SignedInfo` element.
    pub signed_info: NodeId,
    /// Canonicalization applied to `SignedInfo`.
    pub canonicalization: CanonicalizationAlgorithm,
    /// `InclusiveNamespaces` prefixes for `SignedInfo`.
    pub canonicalization_prefixes: Vec<String>,
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// The reference URI, `#` followed by the signed element's ID.
    pub reference_uri: String,
    /// Whether the enveloped-signature transform is applied.
    pub enveloped: bool,
    /// Canonicalization applied to the referenced element.
    pub reference_canonicalization: CanonicalizationAlgorithm,
    /// `InclusiveNamespaces` prefixes for the referenced element.
    pub reference_prefixes: Vec<String>,
    /// The reference digest algorithm.
    pub digest_algorithm: DigestAlgorithm,
    /// The decoded digest value.
    pub digest_value: Vec<u8>,
    /// The decoded signature value.
    pub signature_value: Vec<u8>,
}

/// Configuration for signature creation.
#[derive(Debug, Clone)]
pub struct SignatureConfig {
    /// The signature algorithm to use.
    pub algorithm: SignatureAlgorithm,
    /// The reference digest algorithm to use.
    pub digest: DigestAlgorithm,
    /// Whether to include the X.509 certificate in `KeyInfo`.
    pub include_certificate: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            algorithm: SignatureAlgorithm::RsaSha256,
            digest: DigestAlgorithm::Sha256,
            include_certificate: true,
        }
    }
}

impl SignatureConfig {
    /// Creates a configuration using `algorithm` and its paired digest.
    #[must_use]
    pub fn new(algorithm: SignatureAlgorithm) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(),
            ..Self::default()
        }
    }
}
