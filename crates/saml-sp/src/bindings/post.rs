//! HTTP-POST binding (response consumption).

use base64::Engine;

use crate::error::{SamlError, SamlResult};

use super::{DecodedMessage, SamlMessageType};

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Decodes the value of a `SAMLResponse` form field to XML text.
    ///
    /// IdPs commonly wrap the base64 body at 64 or 76 columns, so ASCII
    /// whitespace is stripped before decoding.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if the value is not base64 or the
    /// decoded bytes are not UTF-8.
    pub fn decode_response(saml_response: &str) -> SamlResult<String> {
        let compact: String = saml_response
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if compact.is_empty() {
            return Err(SamlError::Base64Decode("empty SAMLResponse".to_string()));
        }

        let decoded = base64::engine::general_purpose::STANDARD.decode(compact)?;

        String::from_utf8(decoded)
            .map_err(|e| SamlError::InvalidResponse(format!("Invalid UTF-8 in message: {e}")))
    }

    /// Decodes a POSTed form.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if `SAMLResponse` is absent or cannot
    /// be decoded.
    pub fn decode(saml_response: Option<&str>, relay_state: Option<&str>) -> SamlResult<DecodedMessage> {
        let encoded = saml_response
            .ok_or_else(|| SamlError::InvalidResponse("missing SAMLResponse form field".to_string()))?;

        Ok(DecodedMessage {
            xml: Self::decode_response(encoded)?,
            message_type: SamlMessageType::Response,
            relay_state: relay_state.map(String::from),
            signature: None,
            sig_alg: None,
        })
    }

    /// Encodes a response the way an IdP places it in the POST form.
    #[must_use]
    pub fn encode_response(xml: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(xml)
    }
}
