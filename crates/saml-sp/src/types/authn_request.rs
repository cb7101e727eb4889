//! SAML AuthnRequest types.
//!
//! Authentication request message sent by the service provider to the
//! identity provider.

use chrono::{DateTime, Utc};

use super::{AuthnContextClass, SamlBinding, SAMLP_NS, SAML_NS, SAML_VERSION};
use crate::error::SamlResult;
use crate::settings::Settings;

/// `xs:dateTime` layout used for `IssueInstant`, always UTC.
pub const ISSUE_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// SAML Authentication Request.
///
/// Transient: built, serialized, and dropped within a single
/// [`crate::RequestBuilder::create`] call.
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    /// Unique, unpredictable identifier for this request.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the service provider issuing the request.
    pub issuer: String,

    /// The URL where the response should be sent.
    pub assertion_consumer_service_url: String,

    /// Binding the IdP should use for the response.
    pub protocol_binding: SamlBinding,

    /// Requested NameID format URI.
    pub name_id_format: String,

    /// Whether the IdP may create a new identifier for the principal.
    pub allow_create: bool,

    /// Requested authentication context class.
    pub authn_context: AuthnContextClass,
}

impl AuthnRequest {
    /// Builds a request from settings, with a fresh ID and the current time.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a required setting is empty.
    pub fn from_settings(settings: &Settings) -> SamlResult<Self> {
        settings.require_request_fields()?;

        Ok(Self {
            id: saml_sp_crypto::generate_request_id(),
            issue_instant: Utc::now(),
            issuer: settings.issuer.clone(),
            assertion_consumer_service_url: settings.assertion_consumer_service_url.clone(),
            protocol_binding: SamlBinding::HttpPost,
            name_id_format: settings.name_identifier_format.clone(),
            allow_create: true,
            authn_context: AuthnContextClass::PasswordProtectedTransport,
        })
    }

    /// Returns `IssueInstant` in SAML `dateTime` form.
    #[must_use]
    pub fn issue_instant_str(&self) -> String {
        self.issue_instant.format(ISSUE_INSTANT_FORMAT).to_string()
    }

    /// Serializes the request.
    ///
    /// Namespaces are declared on each element that uses them. The ACS URL,
    /// issuer and NameID format are percent-encoded, which also leaves
    /// nothing in them that needs XML escaping.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let acs_url = urlencoding::encode(&self.assertion_consumer_service_url);
        let issuer = urlencoding::encode(&self.issuer);
        let format = urlencoding::encode(&self.name_id_format);

        let mut xml = String::with_capacity(1024);
        xml.push_str(&format!(
            "<samlp:AuthnRequest xmlns:samlp=\"{SAMLP_NS}\" ID=\"{}\" Version=\"{SAML_VERSION}\" IssueInstant=\"{}\" ProtocolBinding=\"{}\" AssertionConsumerServiceURL=\"{acs_url}\">",
            self.id,
            self.issue_instant_str(),
            self.protocol_binding.uri(),
        ));
        xml.push_str(&format!(
            "<saml:Issuer xmlns:saml=\"{SAML_NS}\">{issuer}</saml:Issuer>\n"
        ));
        xml.push_str(&format!(
            "<samlp:NameIDPolicy xmlns:samlp=\"{SAMLP_NS}\" Format=\"{format}\" AllowCreate=\"{}\"></samlp:NameIDPolicy>\n",
            self.allow_create
        ));
        xml.push_str(&format!(
            "<samlp:RequestedAuthnContext xmlns:samlp=\"{SAMLP_NS}\" Comparison=\"exact\">"
        ));
        xml.push_str(&format!(
            "<saml:AuthnContextClassRef xmlns:saml=\"{SAML_NS}\">{}</saml:AuthnContextClassRef></samlp:RequestedAuthnContext>\n",
            self.authn_context.uri()
        ));
        xml.push_str("</samlp:AuthnRequest>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NameIdFormat;
    use chrono::TimeZone;

    fn settings() -> Settings {
        Settings::default()
            .with_assertion_consumer_service_url("https://sp.example.com/acs?x=1")
            .with_issuer("https://sp.example.com/metadata")
            .with_name_identifier_format(NameIdFormat::Email.uri())
            .with_idp_sso_target_url("https://idp.example.com/sso")
    }

    #[test]
    fn from_settings_populates_fields() {
        let req = AuthnRequest::from_settings(&settings()).unwrap();
        assert_eq!(req.id.len(), 21);
        assert!(req.id.starts_with('_'));
        assert_eq!(req.issuer, "https://sp.example.com/metadata");
        assert_eq!(req.protocol_binding, SamlBinding::HttpPost);
        assert!(req.allow_create);
    }

    #[test]
    fn from_settings_rejects_empty_issuer() {
        let err = AuthnRequest::from_settings(&settings().with_issuer("")).unwrap_err();
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn issue_instant_is_utc_seconds() {
        let mut req = AuthnRequest::from_settings(&settings()).unwrap();
        req.issue_instant = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(req.issue_instant_str(), "2024-03-09T07:05:01Z");
    }

    #[test]
    fn xml_has_fixed_shape() {
        let mut req = AuthnRequest::from_settings(&settings()).unwrap();
        req.id = "_0123456789abcdef0123".to_string();
        req.issue_instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let expected = concat!(
            "<samlp:AuthnRequest xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" ID=\"_0123456789abcdef0123\" Version=\"2.0\" IssueInstant=\"2024-01-02T03:04:05Z\" ProtocolBinding=\"urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST\" AssertionConsumerServiceURL=\"https%3A%2F%2Fsp.example.com%2Facs%3Fx%3D1\">",
            "<saml:Issuer xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\">https%3A%2F%2Fsp.example.com%2Fmetadata</saml:Issuer>\n",
            "<samlp:NameIDPolicy xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" Format=\"urn%3Aoasis%3Anames%3Atc%3ASAML%3A1.1%3Anameid-format%3AemailAddress\" AllowCreate=\"true\"></samlp:NameIDPolicy>\n",
            "<samlp:RequestedAuthnContext xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" Comparison=\"exact\">",
            "<saml:AuthnContextClassRef xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\">urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef></samlp:RequestedAuthnContext>\n",
            "</samlp:AuthnRequest>",
        );
        assert_eq!(req.to_xml(), expected);
    }
}
