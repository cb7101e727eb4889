//! Building the redirect to the IdP.

use crate::bindings::HttpRedirectBinding;
use crate::error::SamlResult;
use crate::settings::Settings;
use crate::types::AuthnRequest;

/// Builds the HTTP-Redirect URL that starts a login at the IdP.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> RequestBuilder<'a> {
    /// Creates a builder over the given settings.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Returns `{idp_sso_target_url}?SAMLRequest=..[&RelayState=..]`.
    ///
    /// Each call issues a fresh request ID and `IssueInstant`. When an SP
    /// private key is configured the query also carries `SigAlg` and
    /// `Signature`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a required setting is empty or the
    /// private key is unusable.
    pub fn create(&self, relay_state: Option<&str>) -> SamlResult<String> {
        let request = AuthnRequest::from_settings(self.settings)?;
        let xml = request.to_xml();
        let destination = self.settings.idp_sso_target_url.as_str();

        let key = self.settings.signing_key()?;
        let signed = key.is_some();
        let url = match key {
            Some(key) => HttpRedirectBinding::encode_signed_request(
                &xml,
                destination,
                relay_state,
                &key,
                self.settings.request_signature_algorithm,
            )?,
            None => HttpRedirectBinding::encode_request(&xml, destination, relay_state)?,
        };

        tracing::debug!(
            request_id = %request.id,
            destination = %destination,
            signed,
            "Created SAML AuthnRequest"
        );

        Ok(url)
    }
}
