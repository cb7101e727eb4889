//! SAML bindings.
//!
//! - **HTTP-Redirect** carries the outgoing `AuthnRequest`: raw DEFLATE,
//!   base64, then percent-encoding into the query string.
//! - **HTTP-POST** carries the incoming `Response` as a base64 form field.

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// AuthnRequest message.
    Request,
    /// Response message.
    Response,
}

impl SamlMessageType {
    /// Returns the form or query parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

/// Decoded SAML binding message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The message type (request or response).
    pub message_type: SamlMessageType,
    /// The RelayState if present.
    pub relay_state: Option<String>,
    /// The detached signature (redirect binding only).
    pub signature: Option<String>,
    /// The detached signature algorithm URI (redirect binding only).
    pub sig_alg: Option<String>,
}
