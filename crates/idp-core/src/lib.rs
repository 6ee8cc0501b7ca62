#![deny(missing_docs)]

//! # idp-core -- Foundational Types for the IDP Integration Layer
//!
//! This crate holds the pieces of the integration layer that never touch the
//! network. It has no internal crate dependencies: only `serde`,
//! `serde_json`, `base64`, and `thiserror` from the external ecosystem.
//!
//! ## Contents
//!
//! 1. **[`token`]**: reads and writes compact two-segment bearer tokens
//!    (`base64url(header).base64url(payload)[.signature]`). Signatures are never
//!    checked: this is a claims inspector, not a trust boundary.
//!
//! 2. **[`scope`]**: the "any-of" / "all-of" decision over a token's `scopes`
//!    claim, used by the HTTP scope gate.
//!
//! 3. **[`error`]**: structured errors built with `thiserror`.

pub mod error;
pub mod scope;
pub mod token;

pub use error::{MalformedToken, ScopeConfigError};
pub use scope::{ScopeDenied, ScopeMode, ScopeRequirement};
pub use token::{decode, encode, DecodedToken};
