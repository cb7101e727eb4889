//! SAML 2.0 Web Browser SSO for service providers.
//!
//! This crate covers the two SP-side steps of the SSO profile:
//!
//! - **Requesting authentication** - [`RequestBuilder`] turns [`Settings`]
//!   into an HTTP-Redirect URL carrying a deflated `AuthnRequest`
//! - **Consuming the response** - [`ResponseValidator`] decodes the posted
//!   `SAMLResponse`, checks its XML signature against the IdP certificate,
//!   and only then exposes the NameID and attributes
//!
//! # Architecture
//!
//! - [`types`] - `AuthnRequest` and SAML constants
//! - [`bindings`] - HTTP-Redirect and HTTP-POST encodings
//! - [`xml`] - a small namespace-aware DOM and exclusive canonicalization
//! - [`signature`] - enveloped XML-DSig verification and signing
//! - [`settings`] - SP configuration
//! - [`error`] - error types
//!
//! # Example
//!
//! ```rust,ignore
//! use saml_sp::{RequestBuilder, ResponseValidator, Settings};
//!
//! let settings = Settings::from_file("saml.toml")?;
//! let redirect = RequestBuilder::new(&settings).create(Some("/dashboard"))?;
//!
//! // ... later, on the assertion consumer endpoint:
//! let response = ResponseValidator::new(&settings, &form.saml_response)?.validate()?;
//! let user = response.name_id()?;
//! let groups = response.attributes()?.remove("groups").unwrap_or_default();
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod error;
mod request;
mod response;
pub mod settings;
pub mod signature;
pub mod types;
pub mod xml;

pub use error::{ErrorKind, SamlError, SamlResult};
pub use request::RequestBuilder;
pub use response::{Attributes, ResponseValidator, Unvalidated, Validated};
pub use settings::Settings;
pub use types::*;
