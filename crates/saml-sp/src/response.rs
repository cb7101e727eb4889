//! Consuming IdP responses.
//!
//! A [`ResponseValidator`] starts out [`Unvalidated`]: the document is parsed
//! but nothing in it is trusted, and no accessor for identity data exists.
//! [`ResponseValidator::validate`] checks the signature and the assertion's
//! conditions and hands back a [`Validated`] validator, which is the only
//! state that exposes the NameID and attributes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use saml_sp_crypto::Certificate;

use crate::bindings::HttpPostBinding;
use crate::error::{ErrorKind, SamlError, SamlResult};
use crate::settings::Settings;
use crate::signature::{SignatureVerifier, XmlSignatureValidator};
use crate::types::{status_codes, SAMLP_NS, SAML_NS, SAML_VERSION};
use crate::xml::{NodeId, XmlDocument};

/// Attribute name to values, in document order.
pub type Attributes = HashMap<String, Vec<String>>;

/// Marker for a response whose signature has not been checked.
#[derive(Debug, Clone, Copy)]
pub struct Unvalidated;

/// Marker for a response that passed [`ResponseValidator::validate`].
#[derive(Debug, Clone, Copy)]
pub struct Validated {
    assertion: NodeId,
}

/// Single-use validator for one `SAMLResponse`.
#[derive(Debug)]
pub struct ResponseValidator<'a, S = Unvalidated> {
    settings: &'a Settings,
    raw_xml: String,
    document: XmlDocument,
    assertion: Option<NodeId>,
    state: S,
}

impl<'a> ResponseValidator<'a, Unvalidated> {
    /// Decodes and parses a base64-encoded `SAMLResponse`.
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error if the value is not base64, not
    /// well-formed XML, or not a SAML 2.0 `Response` with at most one
    /// plaintext assertion.
    pub fn new(settings: &'a Settings, saml_response: &str) -> SamlResult<Self> {
        let raw_xml = HttpPostBinding::decode_response(saml_response)?;
        let document = XmlDocument::parse(&raw_xml)?;
        let root = document.root();

        if !document.is_element(root, SAMLP_NS, "Response") {
            return Err(SamlError::InvalidResponse(
                "root element is not samlp:Response".to_string(),
            ));
        }
        if let Some(version) = document.attribute(root, "Version") {
            if version != SAML_VERSION {
                return Err(SamlError::InvalidResponse(format!(
                    "unsupported SAML version: {version}"
                )));
            }
        }
        if document
            .first_child_named(root, SAML_NS, "EncryptedAssertion")
            .is_some()
        {
            return Err(SamlError::InvalidResponse(
                "encrypted assertions are not supported".to_string(),
            ));
        }

        let (assertion, second) = {
            let mut assertions = document.children_named(root, SAML_NS, "Assertion");
            (assertions.next(), assertions.next())
        };
        if second.is_some() {
            return Err(SamlError::InvalidResponse(
                "response carries more than one assertion".to_string(),
            ));
        }

        tracing::debug!(
            response_id = document.attribute(root, "ID").unwrap_or_default(),
            has_assertion = assertion.is_some(),
            "Parsed SAML response"
        );

        Ok(Self {
            settings,
            raw_xml,
            document,
            assertion,
            state: Unvalidated,
        })
    }

    /// Checks the response signature against the configured IdP certificate.
    ///
    /// Returns `Ok(true)` only when a signature on the assertion, or on the
    /// response enclosing it, verifies. Broken, misplaced, or absent
    /// signatures yield `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no usable IdP certificate is set.
    pub fn is_valid(&self) -> SamlResult<bool> {
        self.is_valid_with(&XmlSignatureValidator::from_settings(self.settings))
    }

    /// Like [`Self::is_valid`], with a caller-supplied verifier.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no usable IdP certificate is set.
    pub fn is_valid_with(&self, verifier: &dyn SignatureVerifier) -> SamlResult<bool> {
        let anchor = self.settings.trust_anchor()?;

        match self.check_signature(verifier, &anchor) {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::SignatureInvalid | ErrorKind::MissingElement) => {
                tracing::warn!(error = %e, "SAML response signature rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Validates the response at the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_with`].
    pub fn validate(self) -> SamlResult<ResponseValidator<'a, Validated>> {
        self.validate_at(Utc::now())
    }

    /// Validates the response as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_with`].
    pub fn validate_at(self, now: DateTime<Utc>) -> SamlResult<ResponseValidator<'a, Validated>> {
        let verifier = XmlSignatureValidator::from_settings(self.settings);
        self.validate_with(&verifier, now)
    }

    /// Validates the response with a caller-supplied verifier.
    ///
    /// Checks, in order: the signature, the top-level status, the
    /// assertion's validity window, and its audience.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: a configuration error for a missing
    /// certificate, [`SamlError::SignatureInvalid`], [`SamlError::AuthenticationFailed`],
    /// [`SamlError::AssertionNotYetValid`], [`SamlError::AssertionExpired`],
    /// or [`SamlError::InvalidAudience`].
    pub fn validate_with(
        self,
        verifier: &dyn SignatureVerifier,
        now: DateTime<Utc>,
    ) -> SamlResult<ResponseValidator<'a, Validated>> {
        let anchor = self.settings.trust_anchor()?;

        if self.assertion.is_none() {
            self.check_status()?;
        }
        let assertion = self.check_signature(verifier, &anchor)?;
        self.check_status()?;
        self.check_conditions(assertion, now)?;
        self.check_audience(assertion)?;

        tracing::debug!(
            assertion_id = self.document.attribute(assertion, "ID").unwrap_or_default(),
            "SAML response validated"
        );

        Ok(ResponseValidator {
            settings: self.settings,
            raw_xml: self.raw_xml,
            document: self.document,
            assertion: Some(assertion),
            state: Validated { assertion },
        })
    }

    fn check_signature(
        &self,
        verifier: &dyn SignatureVerifier,
        anchor: &Certificate,
    ) -> SamlResult<NodeId> {
        let assertion = self
            .assertion
            .ok_or_else(|| SamlError::MissingElement("Assertion".to_string()))?;

        let assertion_signed = verifier.verify_element(&self.document, assertion, anchor)?;
        let response_signed =
            verifier.verify_element(&self.document, self.document.root(), anchor)?;

        if assertion_signed || response_signed {
            Ok(assertion)
        } else {
            Err(SamlError::SignatureInvalid(
                "neither the response nor the assertion is signed".to_string(),
            ))
        }
    }

    fn check_status(&self) -> SamlResult<()> {
        let root = self.document.root();
        let Some(status) = self.document.first_child_named(root, SAMLP_NS, "Status") else {
            return Ok(());
        };

        let code = self
            .document
            .first_child_named(status, SAMLP_NS, "StatusCode")
            .and_then(|c| self.document.attribute(c, "Value"))
            .unwrap_or_default();
        if code == status_codes::SUCCESS {
            return Ok(());
        }

        let message = self
            .document
            .first_child_named(status, SAMLP_NS, "StatusMessage")
            .map(|m| self.document.text_content(m))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| code.to_string());
        Err(SamlError::AuthenticationFailed(message))
    }

    fn check_conditions(&self, assertion: NodeId, now: DateTime<Utc>) -> SamlResult<()> {
        let doc = &self.document;
        let skew_ms = i64::try_from(self.settings.clock_skew_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        if let Some(conditions) = doc.first_child_named(assertion, SAML_NS, "Conditions") {
            if let Some(not_before) = doc.attribute(conditions, "NotBefore") {
                let not_before = parse_instant(not_before, "NotBefore")?;
                if not_before.signed_duration_since(now).num_milliseconds() > skew_ms {
                    return Err(SamlError::AssertionNotYetValid);
                }
            }
            if let Some(not_on_or_after) = doc.attribute(conditions, "NotOnOrAfter") {
                check_not_on_or_after(not_on_or_after, now, skew_ms)?;
            }
        }

        if let Some(subject) = doc.first_child_named(assertion, SAML_NS, "Subject") {
            for confirmation in doc.children_named(subject, SAML_NS, "SubjectConfirmation") {
                for data in doc.children_named(confirmation, SAML_NS, "SubjectConfirmationData") {
                    if let Some(not_on_or_after) = doc.attribute(data, "NotOnOrAfter") {
                        check_not_on_or_after(not_on_or_after, now, skew_ms)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn check_audience(&self, assertion: NodeId) -> SamlResult<()> {
        let expected = self.settings.issuer.as_str();
        if !self.settings.check_audience || expected.is_empty() {
            return Ok(());
        }

        let doc = &self.document;
        let Some(conditions) = doc.first_child_named(assertion, SAML_NS, "Conditions") else {
            return Ok(());
        };

        // Every restriction present must admit this SP.
        for restriction in doc.children_named(conditions, SAML_NS, "AudienceRestriction") {
            let audiences: Vec<String> = doc
                .children_named(restriction, SAML_NS, "Audience")
                .map(|a| doc.text_content(a).trim().to_string())
                .collect();
            if !audiences.iter().any(|a| a == expected) {
                return Err(SamlError::InvalidAudience {
                    expected: expected.to_string(),
                    actual: audiences.join(", "),
                });
            }
        }
        Ok(())
    }
}

impl ResponseValidator<'_, Validated> {
    /// Returns the subject's NameID, exactly as written.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MissingElement`] if the assertion has no
    /// `Subject/NameID`.
    pub fn name_id(&self) -> SamlResult<String> {
        self.name_id_node()
            .map(|n| self.document.text_content(n))
            .ok_or_else(|| SamlError::MissingElement("Assertion/Subject/NameID".to_string()))
    }

    /// Returns the NameID `Format`, if given.
    #[must_use]
    pub fn name_id_format(&self) -> Option<&str> {
        self.name_id_node()
            .and_then(|n| self.document.attribute(n, "Format"))
    }

    /// Returns the assertion issuer, if given.
    #[must_use]
    pub fn issuer(&self) -> Option<String> {
        self.document
            .first_child_named(self.state.assertion, SAML_NS, "Issuer")
            .map(|i| self.document.text_content(i).trim().to_string())
    }

    /// Returns the `SessionIndex` of the first authentication statement.
    #[must_use]
    pub fn session_index(&self) -> Option<&str> {
        self.document
            .first_child_named(self.state.assertion, SAML_NS, "AuthnStatement")
            .and_then(|s| self.document.attribute(s, "SessionIndex"))
    }

    /// Collects the assertion's attributes.
    ///
    /// Values keep document order. When two attributes share a `Name`, the
    /// later one replaces the earlier. An assertion without an
    /// `AttributeStatement` yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::MissingElement`] if an `Attribute` has no `Name`.
    pub fn attributes(&self) -> SamlResult<Attributes> {
        let doc = &self.document;
        let mut attributes = Attributes::new();

        for statement in doc.children_named(self.state.assertion, SAML_NS, "AttributeStatement") {
            for attribute in doc.children_named(statement, SAML_NS, "Attribute") {
                let name = doc.attribute(attribute, "Name").ok_or_else(|| {
                    SamlError::MissingElement("Name attribute on saml:Attribute".to_string())
                })?;
                let values = doc
                    .descendants_named(attribute, SAML_NS, "AttributeValue")
                    .map(|v| doc.text_content(v))
                    .collect();
                attributes.insert(name.to_string(), values);
            }
        }

        Ok(attributes)
    }

    /// Returns the decoded response XML.
    #[must_use]
    pub fn raw_xml(&self) -> &str {
        &self.raw_xml
    }

    /// Returns the parsed response document.
    #[must_use]
    pub const fn document(&self) -> &XmlDocument {
        &self.document
    }

    fn name_id_node(&self) -> Option<NodeId> {
        self.document.find_path(
            self.state.assertion,
            &[(SAML_NS, "Subject"), (SAML_NS, "NameID")],
        )
    }
}

fn parse_instant(value: &str, name: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| SamlError::InvalidResponse(format!("invalid {name} '{value}': {e}")))
}

fn check_not_on_or_after(value: &str, now: DateTime<Utc>, skew_ms: i64) -> SamlResult<()> {
    let not_on_or_after = parse_instant(value, "NotOnOrAfter")?;
    if now.signed_duration_since(not_on_or_after).num_milliseconds() >= skew_ms {
        return Err(SamlError::AssertionExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use chrono::TimeZone;

    use crate::signature::XmlSigner;

    const IDP_KEY: &str = include_str!("../testdata/idp.key.pem");
    const IDP_CERT: &str = include_str!("../testdata/idp.crt.pem");

    const SP_ENTITY: &str = "https://sp.example.com/metadata";

    fn settings() -> Settings {
        Settings::default()
            .with_issuer(SP_ENTITY)
            .with_idp_certificate(IDP_CERT)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn assertion(attribute_statement: &str) -> String {
        format!(
            concat!(
                r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_a1" Version="2.0" IssueInstant="2024-01-01T12:00:00Z">"#,
                "<saml:Issuer>https://idp.example.com</saml:Issuer>",
                "<saml:Subject>",
                r#"<saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">user@example.com</saml:NameID>"#,
                r#"<saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer"><saml:SubjectConfirmationData NotOnOrAfter="2024-01-01T12:05:00Z"/></saml:SubjectConfirmation>"#,
                "</saml:Subject>",
                r#"<saml:Conditions NotBefore="2024-01-01T11:59:00Z" NotOnOrAfter="2024-01-01T12:05:00Z">"#,
                "<saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>",
                "</saml:Conditions>",
                r#"<saml:AuthnStatement AuthnInstant="2024-01-01T12:00:00Z" SessionIndex="_s1"/>"#,
                "{attributes}",
                "</saml:Assertion>",
            ),
            audience = SP_ENTITY,
            attributes = attribute_statement,
        )
    }

    fn response(status: &str, assertion: &str) -> String {
        format!(
            concat!(
                r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r1" Version="2.0" IssueInstant="2024-01-01T12:00:00Z">"#,
                r#"<samlp:Status><samlp:StatusCode Value="{status}"/></samlp:Status>"#,
                "{assertion}",
                "</samlp:Response>",
            ),
            status = status,
            assertion = assertion,
        )
    }

    fn signed_assertion_response(attribute_statement: &str) -> String {
        let signer = XmlSigner::from_pem(IDP_KEY, None).unwrap();
        let xml = response(status_codes::SUCCESS, &assertion(attribute_statement));
        signer.sign(&xml, "_a1").unwrap()
    }

    fn encode(xml: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(xml)
    }

    #[test]
    fn signed_assertion_is_valid() {
        let settings = settings();
        let validator =
            ResponseValidator::new(&settings, &encode(&signed_assertion_response(""))).unwrap();
        assert!(validator.is_valid().unwrap());

        let validated = validator.validate_at(now()).unwrap();
        assert_eq!(validated.name_id().unwrap(), "user@example.com");
        assert_eq!(
            validated.name_id_format(),
            Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
        );
        assert_eq!(validated.issuer().as_deref(), Some("https://idp.example.com"));
        assert_eq!(validated.session_index(), Some("_s1"));
        assert!(validated.attributes().unwrap().is_empty());
    }

    #[test]
    fn signed_response_covers_assertion() {
        let settings = settings();
        let signer = XmlSigner::from_pem(IDP_KEY, None).unwrap();
        let xml = response(status_codes::SUCCESS, &assertion(""));
        let signed = signer.sign(&xml, "_r1").unwrap();

        let validator = ResponseValidator::new(&settings, &encode(&signed)).unwrap();
        assert!(validator.is_valid().unwrap());
        assert!(validator.validate_at(now()).is_ok());
    }

    #[test]
    fn unsigned_response_is_not_valid() {
        let settings = settings();
        let xml = response(status_codes::SUCCESS, &assertion(""));
        let validator = ResponseValidator::new(&settings, &encode(&xml)).unwrap();

        assert!(!validator.is_valid().unwrap());
        let err = validator.validate_at(now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
    }

    #[test]
    fn missing_certificate_is_configuration_error() {
        let settings = Settings::default().with_issuer(SP_ENTITY);
        let validator =
            ResponseValidator::new(&settings, &encode(&signed_assertion_response(""))).unwrap();

        let err = validator.is_valid().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn collects_multi_valued_attributes_in_order() {
        let statement = concat!(
            "<saml:AttributeStatement>",
            r#"<saml:Attribute Name="role"><saml:AttributeValue>admin</saml:AttributeValue><saml:AttributeValue>editor</saml:AttributeValue></saml:Attribute>"#,
            r#"<saml:Attribute Name="mail"><saml:AttributeValue>old@example.com</saml:AttributeValue></saml:Attribute>"#,
            r#"<saml:Attribute Name="mail"><saml:AttributeValue>new@example.com</saml:AttributeValue></saml:Attribute>"#,
            "</saml:AttributeStatement>",
        );
        let settings = settings();
        let validated = ResponseValidator::new(&settings, &encode(&signed_assertion_response(statement)))
            .unwrap()
            .validate_at(now())
            .unwrap();

        let attributes = validated.attributes().unwrap();
        assert_eq!(attributes["role"], vec!["admin", "editor"]);
        assert_eq!(attributes["mail"], vec!["new@example.com"]);
    }

    #[test]
    fn attribute_without_name_is_missing_element() {
        let statement = "<saml:AttributeStatement><saml:Attribute><saml:AttributeValue>x</saml:AttributeValue></saml:Attribute></saml:AttributeStatement>";
        let settings = settings();
        let validated = ResponseValidator::new(&settings, &encode(&signed_assertion_response(statement)))
            .unwrap()
            .validate_at(now())
            .unwrap();

        assert!(matches!(
            validated.attributes().unwrap_err(),
            SamlError::MissingElement(_)
        ));
    }

    #[test]
    fn enforces_validity_window_with_skew() {
        let settings = settings().with_clock_skew_secs(0);
        let encoded = encode(&signed_assertion_response(""));

        let late = Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap();
        let err = ResponseValidator::new(&settings, &encoded)
            .unwrap()
            .validate_at(late)
            .unwrap_err();
        assert!(matches!(err, SamlError::AssertionExpired));

        let early = Utc.with_ymd_and_hms(2024, 1, 1, 11, 58, 0).unwrap();
        let err = ResponseValidator::new(&settings, &encoded)
            .unwrap()
            .validate_at(early)
            .unwrap_err();
        assert!(matches!(err, SamlError::AssertionNotYetValid));

        let settings = settings.with_clock_skew_secs(120);
        assert!(ResponseValidator::new(&settings, &encoded)
            .unwrap()
            .validate_at(early)
            .is_ok());
    }

    #[test]
    fn rejects_foreign_audience() {
        let settings = settings().with_issuer("https://other-sp.example.com");
        let err = ResponseValidator::new(&settings, &encode(&signed_assertion_response("")))
            .unwrap()
            .validate_at(now())
            .unwrap_err();
        assert!(matches!(err, SamlError::InvalidAudience { .. }));

        let settings = settings.with_check_audience(false);
        assert!(ResponseValidator::new(&settings, &encode(&signed_assertion_response("")))
            .unwrap()
            .validate_at(now())
            .is_ok());
    }

    #[test]
    fn failed_status_is_authentication_failure() {
        let xml = format!(
            concat!(
                r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r1" Version="2.0">"#,
                r#"<samlp:Status><samlp:StatusCode Value="{}"/>"#,
                "<samlp:StatusMessage>user cancelled</samlp:StatusMessage></samlp:Status>",
                "</samlp:Response>",
            ),
            status_codes::RESPONDER
        );
        let settings = settings();
        let validator = ResponseValidator::new(&settings, &encode(&xml)).unwrap();
        assert!(!validator.is_valid().unwrap());

        match validator.validate_at(now()).unwrap_err() {
            SamlError::AuthenticationFailed(message) => assert_eq!(message, "user cancelled"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_response_documents() {
        let settings = settings();
        for xml in [
            r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"/>"#,
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" Version="1.1"/>"#,
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"><saml:EncryptedAssertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"/></samlp:Response>"#,
        ] {
            let err = ResponseValidator::new(&settings, &encode(xml)).unwrap_err();
            assert!(err.is_malformed_input(), "{xml}: {err}");
        }
    }

    #[test]
    fn rejects_second_assertion() {
        let xml = response(
            status_codes::SUCCESS,
            &format!("{}{}", assertion(""), assertion("").replace("_a1", "_a2")),
        );
        let settings = settings();
        let err = ResponseValidator::new(&settings, &encode(&xml)).unwrap_err();
        assert!(matches!(err, SamlError::InvalidResponse(_)));
    }

    #[test]
    fn malformed_input_is_reported() {
        let settings = settings();
        for input in ["%%%not base64%%%", "", encode("<unclosed>").as_str()] {
            let err = ResponseValidator::new(&settings, input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput, "{input}");
        }
    }

    /// Signed by the JDK's XML-DSig implementation: namespaces declared on
    /// the Response root, `xs` carried through `InclusiveNamespaces`, and a
    /// line-wrapped `SignatureValue`.
    const JSR105_SIGNED: &str = include_str!("../testdata/response.jsr105-signed.xml");

    #[test]
    fn accepts_response_signed_by_another_implementation() {
        let settings = settings();
        let validator = ResponseValidator::new(&settings, &encode(JSR105_SIGNED)).unwrap();
        assert!(validator.is_valid().unwrap());

        let validated = validator
            .validate_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap())
            .unwrap();
        assert_eq!(validated.name_id().unwrap(), "user@example.com");
        assert_eq!(
            validated.session_index(),
            Some("_be9967abd904ddcae3c0eb4189adbe3f71e327cf93")
        );
        let attributes = validated.attributes().unwrap();
        assert_eq!(attributes["uid"], vec!["user"]);
        assert_eq!(attributes["eduPersonAffiliation"], vec!["member", "staff & faculty"]);
    }

    #[test]
    fn one_byte_edit_breaks_foreign_signature() {
        let settings = settings();
        for (from, to) in [
            ("user@example.com</saml:NameID>", "user@example.con</saml:NameID>"),
            ("staff &amp; faculty", "staff &amp; facultY"),
            ("NotOnOrAfter=\"2024-01-01T12:05:00Z\">", "NotOnOrAfter=\"2024-01-01T13:05:00Z\">"),
        ] {
            assert!(JSR105_SIGNED.contains(from), "{from}");
            let tampered = JSR105_SIGNED.replacen(from, to, 1);
            let validator = ResponseValidator::new(&settings, &encode(&tampered)).unwrap();
            assert!(!validator.is_valid().unwrap(), "{to}");
        }
    }
}
