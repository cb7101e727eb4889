//! SAML 2.0 types and constants.

mod authn_request;
mod constants;

pub use authn_request::*;
pub use constants::*;
