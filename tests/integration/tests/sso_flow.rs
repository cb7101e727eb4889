//! SP-initiated SSO round trips.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use saml_sp::bindings::HttpRedirectBinding;
use saml_sp::signature::XmlSignatureValidator;
use saml_sp::{ErrorKind, RequestBuilder, ResponseValidator, SamlError};
use saml_sp_crypto::Certificate;

use crate::common::{
    encode, sp_settings, ResponseFixture, IDP_SSO_URL, OTHER_CERT, SP_CERT, SP_KEY,
};

fn request_id(xml: &str) -> Option<&str> {
    let start = xml.find(" ID=\"")? + 5;
    let len = xml[start..].find('"')?;
    Some(&xml[start..start + len])
}

#[test]
fn request_ids_are_fresh_and_well_formed() -> anyhow::Result<()> {
    let settings = sp_settings();
    let builder = RequestBuilder::new(&settings);

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let decoded = HttpRedirectBinding::decode_url(&builder.create(None)?)?;
        let id = request_id(&decoded.xml).expect("request carries an ID").to_string();

        assert_eq!(id.len(), 21, "{id}");
        assert!(id.starts_with('_'));
        assert!(id[1..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(seen.insert(id), "request ID repeated");
    }
    Ok(())
}

#[test]
fn redirect_carries_expected_authn_request() -> anyhow::Result<()> {
    let settings = sp_settings();
    let url = RequestBuilder::new(&settings).create(None)?;

    assert!(url.starts_with(&format!("{IDP_SSO_URL}?SAMLRequest=")));
    assert!(!url.contains("&RelayState="));

    let xml = HttpRedirectBinding::decode_url(&url)?.xml;
    for expected in [
        r#"Version="2.0""#,
        r#"ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST""#,
        r#"AssertionConsumerServiceURL="https%3A%2F%2Fsp.example.com%2Facs""#,
        ">https%3A%2F%2Fsp.example.com%2Fmetadata</saml:Issuer>",
        r#"AllowCreate="true""#,
        r#"Comparison="exact""#,
        "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport",
    ] {
        assert!(xml.contains(expected), "missing {expected} in {xml}");
    }
    Ok(())
}

#[test]
fn relay_state_is_appended_when_given() -> anyhow::Result<()> {
    let settings = sp_settings();
    let url = RequestBuilder::new(&settings).create(Some("xyz"))?;

    assert!(url.ends_with("&RelayState=xyz"));
    assert_eq!(
        HttpRedirectBinding::decode_url(&url)?.relay_state.as_deref(),
        Some("xyz")
    );
    Ok(())
}

#[test]
fn message_encoding_round_trips() -> anyhow::Result<()> {
    let xml = "<samlp:AuthnRequest xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" ID=\"_abc\">\n<x>+/=</x></samlp:AuthnRequest>";
    let encoded = HttpRedirectBinding::encode_message(xml)?;

    assert!(!encoded.contains('+') && !encoded.contains('/') && !encoded.contains('='));
    assert_eq!(HttpRedirectBinding::decode_message(&encoded)?, xml);
    Ok(())
}

#[test]
fn signed_redirect_verifies_with_sp_certificate() -> anyhow::Result<()> {
    let settings = sp_settings().with_sp_private_key(SP_KEY);
    let url = RequestBuilder::new(&settings).create(Some("xyz"))?;
    let cert = Certificate::from_pem_or_base64(SP_CERT)?;
    let validator = XmlSignatureValidator::new();

    assert!(validator.verify_redirect_signature(&url, &cert)?);

    let tampered = url.replace("RelayState=xyz", "RelayState=abc");
    assert!(!validator.verify_redirect_signature(&tampered, &cert)?);
    Ok(())
}

#[test]
fn signed_response_yields_identity() -> anyhow::Result<()> {
    let settings = sp_settings();
    let encoded = ResponseFixture::new("user@example.com")
        .attribute("role", &["admin", "editor"])
        .attribute("mail", &["user@example.com"])
        .encoded()?;

    let validator = ResponseValidator::new(&settings, &encoded)?;
    assert!(validator.is_valid()?);

    let response = validator.validate()?;
    assert_eq!(response.name_id()?, "user@example.com");
    assert_eq!(response.session_index(), Some("_session1"));

    let attributes = response.attributes()?;
    assert_eq!(attributes["role"], vec!["admin", "editor"]);
    assert_eq!(attributes["mail"], vec!["user@example.com"]);
    assert_eq!(attributes.len(), 2);
    Ok(())
}

#[test]
fn response_without_attributes_gives_empty_map() -> anyhow::Result<()> {
    let settings = sp_settings();
    let encoded = ResponseFixture::new("user@example.com").encoded()?;

    let response = ResponseValidator::new(&settings, &encoded)?.validate()?;
    assert!(response.attributes()?.is_empty());
    Ok(())
}

#[test]
fn altered_signature_is_not_valid() -> anyhow::Result<()> {
    let settings = sp_settings();
    let signed = ResponseFixture::new("user@example.com").signed_xml()?;

    let marker = "<ds:SignatureValue>";
    let at = signed.find(marker).expect("signature value present") + marker.len();
    let replacement = if signed[at..].starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}{}{}", &signed[..at], replacement, &signed[at + 1..]);

    let validator = ResponseValidator::new(&settings, &encode(&tampered))?;
    assert!(!validator.is_valid()?);

    let err = validator.validate().expect_err("no validated state for a bad signature");
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
    Ok(())
}

#[test]
fn wrong_certificate_is_not_valid() -> anyhow::Result<()> {
    let settings = sp_settings().with_idp_certificate(OTHER_CERT);
    let encoded = ResponseFixture::new("user@example.com").encoded()?;

    let validator = ResponseValidator::new(&settings, &encoded)?;
    assert!(!validator.is_valid()?);
    Ok(())
}

#[test]
fn wrapped_assertion_is_rejected() -> anyhow::Result<()> {
    let settings = sp_settings();
    let signed = ResponseFixture::new("user@example.com").signed_xml()?;

    let start = signed.find("<saml:Assertion").expect("assertion present");
    let end = signed.find("</saml:Assertion>").expect("assertion closed") + "</saml:Assertion>".len();
    let original = &signed[start..end];

    for forged_id in ["_evil", "_assertion1"] {
        let forged = original
            .replace("user@example.com", "admin@example.com")
            .replace(r#"ID="_assertion1""#, &format!(r#"ID="{forged_id}""#));
        let wrapped = format!(
            "{}<samlp:Extensions>{original}</samlp:Extensions>{forged}{}",
            &signed[..start],
            &signed[end..]
        );

        let validator = ResponseValidator::new(&settings, &encode(&wrapped))?;
        assert!(!validator.is_valid()?, "forged ID {forged_id}");
    }
    Ok(())
}

#[test]
fn missing_certificate_is_configuration_error() -> anyhow::Result<()> {
    let mut settings = sp_settings();
    settings.idp_certificate = None;
    let encoded = ResponseFixture::new("user@example.com").encoded()?;

    let err = ResponseValidator::new(&settings, &encoded)?
        .is_valid()
        .expect_err("certificate required");
    assert_eq!(err.kind(), ErrorKind::Configuration);
    Ok(())
}

#[test]
fn malformed_base64_is_malformed_input() {
    let settings = sp_settings();
    let err = ResponseValidator::new(&settings, "this is *not* base64!").expect_err("rejected");
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn expired_assertion_is_rejected() -> anyhow::Result<()> {
    let settings = sp_settings();
    let encoded = ResponseFixture::new("user@example.com")
        .issued_at(Utc::now() - Duration::hours(1))
        .encoded()?;

    let err = ResponseValidator::new(&settings, &encoded)?
        .validate()
        .expect_err("expired");
    assert!(matches!(err, SamlError::AssertionExpired), "{err}");
    assert_eq!(err.kind(), ErrorKind::Rejected);
    Ok(())
}

#[test]
fn foreign_audience_is_rejected() -> anyhow::Result<()> {
    let settings = sp_settings();
    let encoded = ResponseFixture::new("user@example.com")
        .audience("https://other-sp.example.com")
        .encoded()?;

    let err = ResponseValidator::new(&settings, &encoded)?
        .validate()
        .expect_err("wrong audience");
    assert!(matches!(err, SamlError::InvalidAudience { .. }), "{err}");
    Ok(())
}
