//! Enveloped XML signature validation.

use base64::Engine;
use saml_sp_crypto::Certificate;

use crate::bindings::HttpRedirectBinding;
use crate::error::{SamlError, SamlResult};
use crate::settings::Settings;
use crate::types::{transform_algorithms, XMLDSIG_NS};
use crate::xml::{canonicalize, C14nOptions, NodeId, XmlDocument};

use super::{
    CanonicalizationAlgorithm, DigestAlgorithm, SignatureAlgorithm, SignatureVerifier,
    XmlSignature,
};

/// Namespace of the `InclusiveNamespaces` element.
const EXC_C14N_NS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// XML signature validator.
///
/// Trust comes only from the certificate handed to each call; any
/// certificate embedded in `KeyInfo` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSignatureValidator {
    allow_sha1: bool,
}

impl XmlSignatureValidator {
    /// Creates a validator that refuses SHA-1.
    #[must_use]
    pub const fn new() -> Self {
        Self { allow_sha1: false }
    }

    /// Creates a validator configured from settings.
    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self::new().allow_sha1(settings.allow_sha1)
    }

    /// Allows SHA-1 based signatures and digests.
    #[must_use]
    pub const fn allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    /// Verifies the detached signature of an HTTP-Redirect URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL lacks signature parameters or names an
    /// unsupported algorithm.
    pub fn verify_redirect_signature(&self, url: &str, anchor: &Certificate) -> SamlResult<bool> {
        let signed = HttpRedirectBinding::signed_query(url)?;

        let algorithm = SignatureAlgorithm::from_uri(&signed.sig_alg).ok_or_else(|| {
            SamlError::SignatureInvalid(format!("Unknown signature algorithm: {}", signed.sig_alg))
        })?;
        if algorithm.is_deprecated() && !self.allow_sha1 {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 signatures are not allowed".to_string(),
            ));
        }

        let signature = decode_base64(&signed.signature, "Signature")?;
        Ok(saml_sp_crypto::rsa_verify(
            anchor.rsa_public_key(),
            signed.signed_content.as_bytes(),
            &signature,
            algorithm.rsa(),
        )?)
    }

    fn check_algorithms(&self, signature: &XmlSignature) -> SamlResult<()> {
        if self.allow_sha1 {
            return Ok(());
        }
        if signature.algorithm.is_deprecated() {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 signatures are not allowed".to_string(),
            ));
        }
        if signature.digest_algorithm.is_deprecated() {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 digests are not allowed".to_string(),
            ));
        }
        Ok(())
    }
}

impl SignatureVerifier for XmlSignatureValidator {
    fn verify_element(
        &self,
        doc: &XmlDocument,
        element: NodeId,
        anchor: &Certificate,
    ) -> SamlResult<bool> {
        let mut signatures = doc.children_named(element, XMLDSIG_NS, "Signature");
        let Some(sig_node) = signatures.next() else {
            return Ok(false);
        };
        if signatures.next().is_some() {
            return Err(SamlError::SignatureInvalid(
                "element carries more than one signature".to_string(),
            ));
        }

        // With duplicate IDs the reference could resolve to a different
        // element than the one being checked.
        if let Some(dup) = doc.duplicate_id() {
            tracing::warn!(id = %dup, "Duplicate ID in signed document");
            return Err(SamlError::SignatureInvalid(format!("duplicate ID '{dup}'")));
        }

        let element_id = doc
            .attribute(element, "ID")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SamlError::SignatureInvalid("signed element has no ID".to_string()))?;

        let signature = parse_signature(doc, sig_node)?;
        self.check_algorithms(&signature)?;

        if signature.reference_uri.strip_prefix('#') != Some(element_id) {
            tracing::warn!(
                reference = %signature.reference_uri,
                element_id = %element_id,
                "Signature reference does not point at its parent element"
            );
            return Err(SamlError::SignatureInvalid(
                "signature reference does not match the signed element".to_string(),
            ));
        }

        let canonical = canonicalize(
            doc,
            element,
            &C14nOptions {
                with_comments: signature.reference_canonicalization.with_comments(),
                inclusive_prefixes: &signature.reference_prefixes,
                exclude: Some(sig_node),
            },
        )?;
        let digest = saml_sp_crypto::digest(signature.digest_algorithm.hash(), &canonical);
        if digest != signature.digest_value {
            return Err(SamlError::SignatureInvalid("digest mismatch".to_string()));
        }

        let signed_info = canonicalize(
            doc,
            signature.signed_info,
            &C14nOptions {
                with_comments: signature.canonicalization.with_comments(),
                inclusive_prefixes: &signature.canonicalization_prefixes,
                exclude: None,
            },
        )?;
        let verified = saml_sp_crypto::rsa_verify(
            anchor.rsa_public_key(),
            &signed_info,
            &signature.signature_value,
            signature.algorithm.rsa(),
        )?;
        if !verified {
            return Err(SamlError::SignatureInvalid(
                "signature value does not verify against the configured certificate".to_string(),
            ));
        }

        tracing::debug!(
            element_id = %element_id,
            algorithm = signature.algorithm.uri(),
            "Signature verified"
        );
        Ok(true)
    }
}

/// Extracts and checks the structure of a `<ds:Signature>` element.
///
/// # Errors
///
/// Returns [`SamlError::SignatureInvalid`] if a required part is missing,
/// more than one reference is present, or an algorithm is unsupported.
pub fn parse_signature(doc: &XmlDocument, sig_node: NodeId) -> SamlResult<XmlSignature> {
    let signed_info = required_child(doc, sig_node, "SignedInfo")?;

    let c14n_method = required_child(doc, signed_info, "CanonicalizationMethod")?;
    let canonicalization = algorithm_attribute(doc, c14n_method)
        .and_then(CanonicalizationAlgorithm::from_uri)
        .ok_or_else(|| {
            SamlError::SignatureInvalid("unsupported canonicalization method".to_string())
        })?;

    let sig_method = required_child(doc, signed_info, "SignatureMethod")?;
    let algorithm = algorithm_attribute(doc, sig_method)
        .and_then(SignatureAlgorithm::from_uri)
        .ok_or_else(|| SamlError::SignatureInvalid("unsupported signature method".to_string()))?;

    let mut references = doc.children_named(signed_info, XMLDSIG_NS, "Reference");
    let reference = references
        .next()
        .ok_or_else(|| SamlError::SignatureInvalid("missing ds:Reference".to_string()))?;
    if references.next().is_some() {
        return Err(SamlError::SignatureInvalid(
            "signature must carry exactly one reference".to_string(),
        ));
    }
    let reference_uri = doc.attribute(reference, "URI").unwrap_or_default().to_string();

    let mut enveloped = false;
    let mut reference_c14n = None;
    let mut reference_prefixes = Vec::new();
    if let Some(transforms) = doc.first_child_named(reference, XMLDSIG_NS, "Transforms") {
        for transform in doc.children_named(transforms, XMLDSIG_NS, "Transform") {
            match algorithm_attribute(doc, transform) {
                Some(transform_algorithms::ENVELOPED_SIGNATURE) => enveloped = true,
                Some(uri) => {
                    let c14n = CanonicalizationAlgorithm::from_uri(uri).ok_or_else(|| {
                        SamlError::SignatureInvalid(format!("unsupported transform: {uri}"))
                    })?;
                    if reference_c14n.replace(c14n).is_some() {
                        return Err(SamlError::SignatureInvalid(
                            "more than one canonicalization transform".to_string(),
                        ));
                    }
                    reference_prefixes = inclusive_prefixes(doc, transform);
                }
                None => {
                    return Err(SamlError::SignatureInvalid(
                        "transform without algorithm".to_string(),
                    ))
                }
            }
        }
    }
    if !enveloped {
        return Err(SamlError::SignatureInvalid(
            "reference must apply the enveloped-signature transform".to_string(),
        ));
    }
    let reference_canonicalization = reference_c14n.ok_or_else(|| {
        SamlError::SignatureInvalid("reference must apply exclusive canonicalization".to_string())
    })?;

    let digest_method = required_child(doc, reference, "DigestMethod")?;
    let digest_algorithm = algorithm_attribute(doc, digest_method)
        .and_then(DigestAlgorithm::from_uri)
        .ok_or_else(|| SamlError::SignatureInvalid("unsupported digest method".to_string()))?;

    let digest_value = required_child(doc, reference, "DigestValue")?;
    let digest_value = decode_base64(&doc.text_content(digest_value), "DigestValue")?;

    let signature_value = required_child(doc, sig_node, "SignatureValue")?;
    let signature_value = decode_base64(&doc.text_content(signature_value), "SignatureValue")?;

    Ok(XmlSignature {
        node: sig_node,
        signed_info,
        canonicalization,
        canonicalization_prefixes: inclusive_prefixes(doc, c14n_method),
        algorithm,
        reference_uri,
        enveloped,
        reference_canonicalization,
        reference_prefixes,
        digest_algorithm,
        digest_value,
        signature_value,
    })
}

fn required_child(doc: &XmlDocument, parent: NodeId, local_name: &str) -> SamlResult<NodeId> {
    doc.first_child_named(parent, XMLDSIG_NS, local_name)
        .ok_or_else(|| SamlError::SignatureInvalid(format!("missing ds:{local_name}")))
}

fn algorithm_attribute(doc: &XmlDocument, node: NodeId) -> Option<&str> {
    doc.attribute(node, "Algorithm")
}

fn inclusive_prefixes(doc: &XmlDocument, method: NodeId) -> Vec<String> {
    doc.first_child_named(method, EXC_C14N_NS, "InclusiveNamespaces")
        .and_then(|n| doc.attribute(n, "PrefixList"))
        .map(|list| list.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn decode_base64(value: &str, what: &str) -> SamlResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| SamlError::SignatureInvalid(format!("invalid {what} encoding: {e}")))
}
