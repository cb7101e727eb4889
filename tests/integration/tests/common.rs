//! Common test utilities and fixtures.

use chrono::{DateTime, Duration, Utc};

use saml_sp::bindings::HttpPostBinding;
use saml_sp::signature::XmlSigner;
use saml_sp::{status_codes, Settings};

pub const IDP_KEY: &str = include_str!("../../../crates/saml-sp/testdata/idp.key.pem");
pub const IDP_CERT: &str = include_str!("../../../crates/saml-sp/testdata/idp.crt.pem");
pub const OTHER_CERT: &str = include_str!("../../../crates/saml-sp/testdata/other.crt.pem");
pub const SP_KEY: &str = include_str!("../../../crates/saml-sp/testdata/sp.key.pem");
pub const SP_CERT: &str = include_str!("../../../crates/saml-sp/testdata/sp.crt.pem");

pub const SP_ENTITY_ID: &str = "https://sp.example.com/metadata";
pub const IDP_SSO_URL: &str = "https://idp.example.com/sso";

/// Installs a test subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("saml_sp=debug")
        .with_test_writer()
        .try_init();
}

/// Settings for an SP that trusts the test IdP.
pub fn sp_settings() -> Settings {
    init_tracing();
    Settings::default()
        .with_assertion_consumer_service_url("https://sp.example.com/acs")
        .with_issuer(SP_ENTITY_ID)
        .with_name_identifier_format("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
        .with_idp_sso_target_url(IDP_SSO_URL)
        .with_idp_certificate(IDP_CERT)
}

/// A response as the test IdP would issue it.
pub struct ResponseFixture {
    pub name_id: String,
    pub audience: String,
    pub attributes: Vec<(String, Vec<String>)>,
    pub issued_at: DateTime<Utc>,
    pub lifetime: Duration,
}

impl ResponseFixture {
    pub fn new(name_id: &str) -> Self {
        Self {
            name_id: name_id.to_string(),
            audience: SP_ENTITY_ID.to_string(),
            attributes: Vec::new(),
            issued_at: Utc::now(),
            lifetime: Duration::minutes(5),
        }
    }

    pub fn attribute(mut self, name: &str, values: &[&str]) -> Self {
        self.attributes.push((
            name.to_string(),
            values.iter().map(|v| (*v).to_string()).collect(),
        ));
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = at;
        self
    }

    /// Assertion `_assertion1` inside response `_response1`, unsigned.
    pub fn xml(&self) -> String {
        let instant = |t: DateTime<Utc>| t.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let issued = instant(self.issued_at);
        let not_before = instant(self.issued_at - Duration::seconds(30));
        let expires = instant(self.issued_at + self.lifetime);

        let attribute_statement = if self.attributes.is_empty() {
            String::new()
        } else {
            let attributes: String = self
                .attributes
                .iter()
                .map(|(name, values)| {
                    let values: String = values
                        .iter()
                        .map(|v| format!("<saml:AttributeValue>{v}</saml:AttributeValue>"))
                        .collect();
                    format!(r#"<saml:Attribute Name="{name}">{values}</saml:Attribute>"#)
                })
                .collect();
            format!("<saml:AttributeStatement>{attributes}</saml:AttributeStatement>")
        };

        format!(
            concat!(
                r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_response1" Version="2.0" IssueInstant="{issued}" Destination="https://sp.example.com/acs">"#,
                "<saml:Issuer>https://idp.example.com</saml:Issuer>",
                r#"<samlp:Status><samlp:StatusCode Value="{success}"/></samlp:Status>"#,
                r#"<saml:Assertion ID="_assertion1" Version="2.0" IssueInstant="{issued}">"#,
                "<saml:Issuer>https://idp.example.com</saml:Issuer>",
                "<saml:Subject>",
                r#"<saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">{name_id}</saml:NameID>"#,
                r#"<saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">"#,
                r#"<saml:SubjectConfirmationData NotOnOrAfter="{expires}" Recipient="https://sp.example.com/acs"/>"#,
                "</saml:SubjectConfirmation>",
                "</saml:Subject>",
                r#"<saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{expires}">"#,
                "<saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>",
                "</saml:Conditions>",
                r#"<saml:AuthnStatement AuthnInstant="{issued}" SessionIndex="_session1">"#,
                "<saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef></saml:AuthnContext>",
                "</saml:AuthnStatement>",
                "{attribute_statement}",
                "</saml:Assertion>",
                "</samlp:Response>",
            ),
            issued = issued,
            not_before = not_before,
            expires = expires,
            success = status_codes::SUCCESS,
            name_id = self.name_id,
            audience = self.audience,
            attribute_statement = attribute_statement,
        )
    }

    /// XML with the assertion signed by the test IdP.
    pub fn signed_xml(&self) -> anyhow::Result<String> {
        let signer = XmlSigner::from_pem(IDP_KEY, Some(IDP_CERT))?;
        Ok(signer.sign(&self.xml(), "_assertion1")?)
    }

    /// The `SAMLResponse` form value for the signed response.
    pub fn encoded(&self) -> anyhow::Result<String> {
        Ok(encode(&self.signed_xml()?))
    }
}

pub fn encode(xml: &str) -> String {
    HttpPostBinding::encode_response(xml)
}
