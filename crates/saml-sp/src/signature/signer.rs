//! Enveloped XML signature creation.
//!
//! The SP itself only signs redirect queries; this signer exists for IdP
//! tooling and for building signed fixtures.

use base64::Engine;
use saml_sp_crypto::{Certificate, PrivateKey};

use crate::error::{SamlError, SamlResult};
use crate::types::{transform_algorithms, SAML_NS, XMLDSIG_NS};
use crate::xml::{canonicalize, C14nOptions, XmlDocument};

use super::SignatureConfig;

/// XML signer.
#[derive(Debug, Clone)]
pub struct XmlSigner {
    key: PrivateKey,
    certificate: Option<Certificate>,
    config: SignatureConfig,
}

impl XmlSigner {
    /// Creates a signer from a parsed key and optional certificate.
    #[must_use]
    pub fn new(key: PrivateKey, certificate: Option<Certificate>) -> Self {
        Self {
            key,
            certificate,
            config: SignatureConfig::default(),
        }
    }

    /// Creates a signer from PEM-encoded key and certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if either PEM document cannot be parsed.
    pub fn from_pem(private_key_pem: &str, certificate_pem: Option<&str>) -> SamlResult<Self> {
        let key = PrivateKey::from_pem(private_key_pem)?;
        let certificate = certificate_pem
            .map(Certificate::from_pem_or_base64)
            .transpose()?;

        Ok(Self::new(key, certificate))
    }

    /// Sets the signature configuration.
    #[must_use]
    pub fn with_config(mut self, config: SignatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Signs the element whose `ID` is `reference_id`.
    ///
    /// The `<ds:Signature>` is inserted right after the element's
    /// `saml:Issuer` child, or as its first child when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse, no single element
    /// carries the ID, the element is already signed, or signing fails.
    pub fn sign(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        let doc = XmlDocument::parse(xml)?;
        if let Some(dup) = doc.duplicate_id() {
            return Err(SamlError::SignatureCreation(format!("duplicate ID '{dup}'")));
        }

        let target = doc.element_by_id(reference_id).ok_or_else(|| {
            SamlError::MissingElement(format!("element with ID '{reference_id}'"))
        })?;
        if doc.first_child_named(target, XMLDSIG_NS, "Signature").is_some() {
            return Err(SamlError::SignatureCreation(format!(
                "element '{reference_id}' is already signed"
            )));
        }

        let insert_at = {
            let element = doc
                .element(target)
                .ok_or_else(|| SamlError::SignatureCreation("target is not an element".to_string()))?;
            if element.content_start == element.span.end {
                return Err(SamlError::SignatureCreation(
                    "cannot sign an empty-element tag".to_string(),
                ));
            }
            doc.first_child_named(target, SAML_NS, "Issuer")
                .and_then(|issuer| doc.element(issuer))
                .map_or(element.content_start, |issuer| issuer.span.end)
        };

        let canonical = canonicalize(&doc, target, &C14nOptions::default())?;
        let digest = saml_sp_crypto::digest(self.config.digest.hash(), &canonical);
        let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

        let mut with_signature = String::with_capacity(xml.len() + 2048);
        with_signature.push_str(&xml[..insert_at]);
        with_signature.push_str(&self.build_signature_element(reference_id, &digest_b64));
        with_signature.push_str(&xml[insert_at..]);

        let doc = XmlDocument::parse(&with_signature)?;
        let missing = || SamlError::SignatureCreation("inserted signature not found".to_string());
        let target = doc.element_by_id(reference_id).ok_or_else(missing)?;
        let sig = doc
            .first_child_named(target, XMLDSIG_NS, "Signature")
            .ok_or_else(missing)?;
        let signed_info = doc
            .first_child_named(sig, XMLDSIG_NS, "SignedInfo")
            .ok_or_else(missing)?;
        let value_at = doc
            .first_child_named(sig, XMLDSIG_NS, "SignatureValue")
            .and_then(|v| doc.element(v))
            .map(|v| v.content_start)
            .ok_or_else(missing)?;

        let canonical_signed_info = canonicalize(&doc, signed_info, &C14nOptions::default())?;
        let signature = saml_sp_crypto::rsa_sign(
            self.key.der(),
            &canonical_signed_info,
            self.config.algorithm.rsa(),
        )?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);

        tracing::debug!(
            reference_id = %reference_id,
            algorithm = self.config.algorithm.uri(),
            "Signed element"
        );

        let mut signed = String::with_capacity(with_signature.len() + signature_b64.len());
        signed.push_str(&with_signature[..value_at]);
        signed.push_str(&signature_b64);
        signed.push_str(&with_signature[value_at..]);
        Ok(signed)
    }

    /// Builds the `<ds:Signature>` element with an empty `SignatureValue`.
    fn build_signature_element(&self, reference_id: &str, digest_b64: &str) -> String {
        let key_info = match (&self.certificate, self.config.include_certificate) {
            (Some(cert), true) => format!(
                "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>",
                base64::engine::general_purpose::STANDARD.encode(cert.der())
            ),
            _ => String::new(),
        };

        format!(
            concat!(
                "<ds:Signature xmlns:ds=\"{ds}\">",
                "<ds:SignedInfo>",
                "<ds:CanonicalizationMethod Algorithm=\"{c14n}\"/>",
                "<ds:SignatureMethod Algorithm=\"{sig_alg}\"/>",
                "<ds:Reference URI=\"#{id}\">",
                "<ds:Transforms>",
                "<ds:Transform Algorithm=\"{enveloped}\"/>",
                "<ds:Transform Algorithm=\"{c14n}\"/>",
                "</ds:Transforms>",
                "<ds:DigestMethod Algorithm=\"{digest_alg}\"/>",
                "<ds:DigestValue>{digest}</ds:DigestValue>",
                "</ds:Reference>",
                "</ds:SignedInfo>",
                "<ds:SignatureValue></ds:SignatureValue>",
                "{key_info}",
                "</ds:Signature>",
            ),
            ds = XMLDSIG_NS,
            c14n = transform_algorithms::EXCLUSIVE_C14N,
            sig_alg = self.config.algorithm.uri(),
            id = quick_xml::escape::escape(reference_id),
            enveloped = transform_algorithms::ENVELOPED_SIGNATURE,
            digest_alg = self.config.digest.uri(),
            digest = digest_b64,
            key_info = key_info,
        )
    }
}
