//! # Error Types
//!
//! Structured errors for token decoding and scope configuration, built with
//! `thiserror`. Each variant carries enough context to tell which part of the
//! input was rejected without echoing the token itself.

use thiserror::Error;

/// A compact token could not be read.
///
/// Every variant means the token is malformed; the variant only records which
/// check failed.
#[derive(Error, Debug)]
pub enum MalformedToken {
    /// The input was empty or contained only whitespace.
    #[error("malformed token: empty input")]
    Empty,

    /// Fewer than two `.`-separated segments were found.
    #[error("malformed token: expected at least 2 segments, found {found}")]
    MissingSegments {
        /// Number of segments actually present.
        found: usize,
    },

    /// A segment is not valid base64url.
    #[error("malformed token: {segment} segment is not valid base64url: {source}")]
    InvalidBase64 {
        /// Which segment failed (`header` or `payload`).
        segment: &'static str,
        /// The underlying decode error.
        source: base64::DecodeError,
    },

    /// A segment decoded to bytes that are not valid JSON.
    #[error("malformed token: {segment} segment is not valid JSON: {source}")]
    InvalidJson {
        /// Which segment failed (`header` or `payload`).
        segment: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A segment decoded to JSON that is not an object.
    #[error("malformed token: {segment} segment is not a JSON object")]
    NotAnObject {
        /// Which segment failed (`header` or `payload`).
        segment: &'static str,
    },
}

/// A scope requirement was configured in a way that can never be evaluated
/// meaningfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeConfigError {
    /// No required scopes were given.
    #[error("scope requirement must name at least one scope")]
    Empty,

    /// A required scope was the empty string.
    #[error("scope requirement contains a blank scope name")]
    BlankScope,
}
