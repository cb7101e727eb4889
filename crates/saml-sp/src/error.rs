//! SAML error types.
//!
//! Every failure surfaces as a [`SamlError`]. [`SamlError::kind`] folds the
//! variants into the four categories callers usually branch on, plus
//! `Rejected` for responses that are authentic but not acceptable.

use saml_sp_crypto::SignatureError;
use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Broad classification of a [`SamlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings lack a value the operation needs.
    Configuration,
    /// Input is not valid base64, XML, or SAML.
    MalformedInput,
    /// The signature is absent from where it must be, broken, or untrusted.
    SignatureInvalid,
    /// A required element is absent from an authentic document.
    MissingElement,
    /// The document is authentic but its content is not acceptable.
    Rejected,
}

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// A required setting is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid SAML response format or content.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// XML signature validation failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// XML signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// The IdP answered with a non-success status.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Assertion expired.
    #[error("assertion expired")]
    AssertionExpired,

    /// Assertion not yet valid.
    #[error("assertion not yet valid")]
    AssertionNotYetValid,

    /// Invalid audience.
    #[error("invalid audience: expected {expected}, got {actual}")]
    InvalidAudience {
        /// The expected audience URI.
        expected: String,
        /// The actual audience URI(s).
        actual: String,
    },

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl SamlError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidResponse(_)
            | Self::XmlParse(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_) => ErrorKind::MalformedInput,
            Self::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            Self::MissingElement(_) => ErrorKind::MissingElement,
            Self::AuthenticationFailed(_)
            | Self::AssertionExpired
            | Self::AssertionNotYetValid
            | Self::InvalidAudience { .. } => ErrorKind::Rejected,
            Self::Crypto(_) | Self::SignatureCreation(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true for errors caused by unreadable input.
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::MalformedInput)
    }

    /// Returns the HTTP status an assertion consumer endpoint should answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::MalformedInput | ErrorKind::MissingElement => 400,
            ErrorKind::SignatureInvalid | ErrorKind::Rejected => 401,
            ErrorKind::Configuration => 500,
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}

impl From<SignatureError> for SamlError {
    fn from(err: SignatureError) -> Self {
        Self::Crypto(err.to_string())
    }
}
