//! Service provider settings.
//!
//! `Settings` is a plain value loaded once at startup and shared read-only
//! by every request and response handled afterwards. Fields are checked
//! lazily by the operation that needs them, so a deployment that only
//! consumes responses does not have to configure the request side.

use std::fmt;
use std::path::Path;

use saml_sp_crypto::{Certificate, PrivateKey};
use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};
use crate::signature::SignatureAlgorithm;

/// Default clock skew tolerance in seconds.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 180;

/// Service provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// URL the IdP posts the response back to.
    pub assertion_consumer_service_url: String,

    /// SP entity ID, sent as `Issuer` and expected as `Audience`.
    pub issuer: String,

    /// Requested NameID format URI.
    pub name_identifier_format: String,

    /// IdP single sign-on endpoint.
    pub idp_sso_target_url: String,

    /// IdP signing certificate, PEM or bare base64 DER.
    pub idp_certificate: Option<String>,

    /// SP private key (PEM). When set, redirect requests are signed.
    pub sp_private_key: Option<String>,

    /// Algorithm used to sign redirect requests.
    pub request_signature_algorithm: SignatureAlgorithm,

    /// Accept SHA-1 based response signatures.
    pub allow_sha1: bool,

    /// Tolerance applied to assertion validity windows.
    pub clock_skew_secs: u64,

    /// Require the assertion audience to name this SP.
    pub check_audience: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assertion_consumer_service_url: String::new(),
            issuer: String::new(),
            name_identifier_format: String::new(),
            idp_sso_target_url: String::new(),
            idp_certificate: None,
            sp_private_key: None,
            request_signature_algorithm: SignatureAlgorithm::RsaSha256,
            allow_sha1: false,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            check_audience: true,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field(
                "assertion_consumer_service_url",
                &self.assertion_consumer_service_url,
            )
            .field("issuer", &self.issuer)
            .field("name_identifier_format", &self.name_identifier_format)
            .field("idp_sso_target_url", &self.idp_sso_target_url)
            .field("idp_certificate", &self.idp_certificate.is_some())
            .field("sp_private_key", &self.sp_private_key.as_ref().map(|_| "<redacted>"))
            .field("request_signature_algorithm", &self.request_signature_algorithm)
            .field("allow_sha1", &self.allow_sha1)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("check_audience", &self.check_audience)
            .finish()
    }
}

impl Settings {
    /// Parses settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document does not parse.
    pub fn from_toml_str(content: &str) -> SamlResult<Self> {
        toml::from_str(content)
            .map_err(|e| SamlError::Configuration(format!("failed to parse settings: {e}")))
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> SamlResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SamlError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_assertion_consumer_service_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = url.into();
        self
    }

    /// Sets the SP entity ID.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the requested NameID format.
    #[must_use]
    pub fn with_name_identifier_format(mut self, format: impl Into<String>) -> Self {
        self.name_identifier_format = format.into();
        self
    }

    /// Sets the IdP SSO endpoint.
    #[must_use]
    pub fn with_idp_sso_target_url(mut self, url: impl Into<String>) -> Self {
        self.idp_sso_target_url = url.into();
        self
    }

    /// Sets the IdP certificate.
    #[must_use]
    pub fn with_idp_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.idp_certificate = Some(certificate.into());
        self
    }

    /// Sets the SP private key used to sign requests.
    #[must_use]
    pub fn with_sp_private_key(mut self, key_pem: impl Into<String>) -> Self {
        self.sp_private_key = Some(key_pem.into());
        self
    }

    /// Sets whether SHA-1 signatures are accepted.
    #[must_use]
    pub fn with_allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    /// Sets the clock skew tolerance.
    #[must_use]
    pub fn with_clock_skew_secs(mut self, secs: u64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    /// Sets whether the audience restriction is enforced.
    #[must_use]
    pub fn with_check_audience(mut self, check: bool) -> Self {
        self.check_audience = check;
        self
    }

    /// Checks the fields needed to build an authentication request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first empty field.
    pub fn require_request_fields(&self) -> SamlResult<()> {
        let fields = [
            (
                "assertion_consumer_service_url",
                &self.assertion_consumer_service_url,
            ),
            ("issuer", &self.issuer),
            ("name_identifier_format", &self.name_identifier_format),
            ("idp_sso_target_url", &self.idp_sso_target_url),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(SamlError::Configuration(format!("{name} is not set")));
            }
        }
        Ok(())
    }

    /// Returns the parsed IdP certificate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the certificate is missing or unusable.
    pub fn trust_anchor(&self) -> SamlResult<Certificate> {
        let pem = self
            .idp_certificate
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SamlError::Configuration("idp_certificate is not set".to_string()))?;

        Certificate::from_pem_or_base64(pem)
            .map_err(|e| SamlError::Configuration(format!("idp_certificate: {e}")))
    }

    /// Returns the SP signing key, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is present but unusable.
    pub fn signing_key(&self) -> SamlResult<Option<PrivateKey>> {
        self.sp_private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|pem| {
                PrivateKey::from_pem(pem)
                    .map_err(|e| SamlError::Configuration(format!("sp_private_key: {e}")))
            })
            .transpose()
    }
}
