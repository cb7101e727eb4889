//! HTTP-Redirect binding.

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use saml_sp_crypto::PrivateKey;
use std::io::{Read, Write};

use crate::error::{SamlError, SamlResult};
use crate::signature::SignatureAlgorithm;

use super::{DecodedMessage, SamlMessageType};

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

/// The parts of a redirect query covered by a detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// `SAMLRequest=..[&RelayState=..]&SigAlg=..` exactly as it appeared on the wire.
    pub signed_content: String,
    /// Decoded `SigAlg` value.
    pub sig_alg: String,
    /// Decoded `Signature` value (base64).
    pub signature: String,
}

impl HttpRedirectBinding {
    /// Applies the message encoding chain: raw DEFLATE, base64, percent-encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn encode_message(xml: &str) -> SamlResult<String> {
        let compressed = deflate_compress(xml.as_bytes())?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);
        Ok(urlencoding::encode(&encoded).into_owned())
    }

    /// Reverses [`Self::encode_message`].
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if any stage of the chain fails.
    pub fn decode_message(encoded: &str) -> SamlResult<String> {
        let url_decoded = urlencoding::decode(encoded)
            .map_err(|e| SamlError::InvalidResponse(format!("URL decode error: {e}")))?;

        let b64_decoded =
            base64::engine::general_purpose::STANDARD.decode(url_decoded.as_bytes())?;

        let xml_bytes = deflate_decompress(&b64_decoded)?;

        String::from_utf8(xml_bytes)
            .map_err(|e| SamlError::InvalidResponse(format!("Invalid UTF-8 in message: {e}")))
    }

    /// Builds the redirect URL for an unsigned request.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let query = Self::request_query(xml, relay_state)?;
        Ok(join_url(destination, &query))
    }

    /// Builds the redirect URL for a request carrying a detached signature.
    ///
    /// The signature covers `SAMLRequest=..&RelayState=..&SigAlg=..` in that
    /// order, with each value already percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or signing fails.
    pub fn encode_signed_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        key: &PrivateKey,
        algorithm: SignatureAlgorithm,
    ) -> SamlResult<String> {
        let mut query = Self::request_query(xml, relay_state)?;
        query.push_str("&SigAlg=");
        query.push_str(&urlencoding::encode(algorithm.uri()));

        let signature = saml_sp_crypto::rsa_sign(key.der(), query.as_bytes(), algorithm.rsa())?;
        let signature = base64::engine::general_purpose::STANDARD.encode(signature);

        query.push_str("&Signature=");
        query.push_str(&urlencoding::encode(&signature));

        Ok(join_url(destination, &query))
    }

    fn request_query(xml: &str, relay_state: Option<&str>) -> SamlResult<String> {
        let mut query = format!(
            "{}={}",
            SamlMessageType::Request.form_param(),
            Self::encode_message(xml)?
        );

        if let Some(rs) = relay_state {
            query.push_str("&RelayState=");
            query.push_str(&urlencoding::encode(rs));
        }

        Ok(query)
    }

    /// Decodes a request from already-split query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `SAMLRequest` is absent or cannot be decoded.
    pub fn decode(
        saml_request: Option<&str>,
        relay_state: Option<&str>,
        signature: Option<&str>,
        sig_alg: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let encoded = saml_request.ok_or_else(|| {
            SamlError::MissingElement("SAMLRequest query parameter".to_string())
        })?;

        Ok(DecodedMessage {
            xml: Self::decode_message(encoded)?,
            message_type: SamlMessageType::Request,
            relay_state: relay_state.map(String::from),
            signature: signature.map(String::from),
            sig_alg: sig_alg.map(String::from),
        })
    }

    /// Decodes a request from a full redirect URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or the embedded message is malformed.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SamlError::InvalidResponse(format!("Invalid URL: {e}")))?;

        let mut saml_request = None;
        let mut relay_state = None;
        let mut signature = None;
        let mut sig_alg = None;

        // query_pairs() has already percent-decoded the values, so re-encode
        // SAMLRequest before handing it to the shared decoding chain.
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "SAMLRequest" => saml_request = Some(urlencoding::encode(&value).into_owned()),
                "RelayState" => relay_state = Some(value.into_owned()),
                "Signature" => signature = Some(value.into_owned()),
                "SigAlg" => sig_alg = Some(value.into_owned()),
                _ => {}
            }
        }

        Self::decode(
            saml_request.as_deref(),
            relay_state.as_deref(),
            signature.as_deref(),
            sig_alg.as_deref(),
        )
    }

    /// Splits a signed redirect URL into the signed content and its signature.
    ///
    /// The signed content is taken verbatim from the raw query string; the
    /// signer's percent-encoding must be preserved for verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no `SigAlg` or `Signature` parameter.
    pub fn signed_query(url: &str) -> SamlResult<SignedQuery> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SamlError::InvalidResponse(format!("Invalid URL: {e}")))?;
        let query = parsed.query().unwrap_or_default();

        let mut message = None;
        let mut relay_state = None;
        let mut sig_alg = None;
        let mut signature = None;

        for part in query.split('&') {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            match key {
                "SAMLRequest" | "SAMLResponse" => message = Some(part),
                "RelayState" => relay_state = Some(part),
                "SigAlg" => sig_alg = Some((part, value)),
                "Signature" => signature = Some(value),
                _ => {}
            }
        }

        let message = message
            .ok_or_else(|| SamlError::MissingElement("SAMLRequest query parameter".to_string()))?;
        let (sig_alg_part, sig_alg) = sig_alg
            .ok_or_else(|| SamlError::MissingElement("SigAlg query parameter".to_string()))?;
        let signature = signature
            .ok_or_else(|| SamlError::MissingElement("Signature query parameter".to_string()))?;

        let signed_content = [Some(message), relay_state, Some(sig_alg_part)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("&");

        Ok(SignedQuery {
            signed_content,
            sig_alg: percent_decode(sig_alg)?,
            signature: percent_decode(signature)?,
        })
    }
}

fn join_url(destination: &str, query: &str) -> String {
    let separator = if destination.contains('?') { '&' } else { '?' };
    format!("{destination}{separator}{query}")
}

fn percent_decode(value: &str) -> SamlResult<String> {
    urlencoding::decode(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SamlError::InvalidResponse(format!("URL decode error: {e}")))
}

/// Compresses data using raw DEFLATE (no zlib header).
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Deflate(format!("Compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("Compression finish error: {e}")))
}

/// Decompresses raw DEFLATE data.
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Deflate(format!("Decompression error: {e}")))?;
    Ok(decompressed)
}
