//! End-to-end SSO flow tests.
//!
//! These tests drive the SP through a full round trip: build the redirect,
//! decode it as the IdP would, then feed back responses signed by a test IdP.

mod common;
mod sso_flow;
