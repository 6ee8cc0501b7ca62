//! # Compact Token Codec
//!
//! Reads and writes the compact token form used by the IDP:
//!
//! ```text
//! base64url(header-json) "." base64url(payload-json) [ "." signature ]
//! ```
//!
//! Only the first two segments are interpreted. Any third segment is ignored:
//! signatures are never verified here. Callers must have authenticated the
//! token's issuer some other way before trusting claims for anything beyond
//! scope inspection.
//!
//! Decoding tolerates a leading scheme (`"Bearer <token>"`): only the last
//! whitespace-delimited word of the input is parsed. Padding on the base64url
//! segments is accepted but not required.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::MalformedToken;

/// A JSON object of claims or header parameters.
pub type Claims = Map<String, Value>;

/// URL-safe alphabet, unpadded output, padding optional on input.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Header and payload of a compact token.
///
/// Derived data: it can be rebuilt from the token string at any time and is
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    header: Claims,
    payload: Claims,
}

impl DecodedToken {
    /// Build a token from already-parsed parts.
    pub fn new(header: Claims, payload: Claims) -> Self {
        Self { header, payload }
    }

    /// The header object (e.g. `alg`, `typ`).
    pub fn header(&self) -> &Claims {
        &self.header
    }

    /// The payload object (e.g. `sub`, `scopes`).
    pub fn payload(&self) -> &Claims {
        &self.payload
    }

    /// Look up a single payload claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Consume the token, returning `(header, payload)`.
    pub fn into_parts(self) -> (Claims, Claims) {
        (self.header, self.payload)
    }
}

/// Decode a compact token into its header and payload.
///
/// Pure and idempotent: the same input always yields the same result.
pub fn decode(token: &str) -> Result<DecodedToken, MalformedToken> {
    let compact = token
        .split_whitespace()
        .last()
        .ok_or(MalformedToken::Empty)?;

    let mut segments = compact.split('.');
    // `split` always yields at least one item.
    let header = segments.next().unwrap_or_default();
    let payload = segments
        .next()
        .ok_or(MalformedToken::MissingSegments { found: 1 })?;

    Ok(DecodedToken {
        header: decode_segment("header", header)?,
        payload: decode_segment("payload", payload)?,
    })
}

/// Encode a header and payload as an unsigned two-segment compact token.
///
/// `decode(&encode(h, p))` yields `h` and `p` again.
pub fn encode(header: &Claims, payload: &Claims) -> String {
    format!(
        "{}.{}",
        encode_segment(header),
        encode_segment(payload)
    )
}

fn decode_segment(segment: &'static str, raw: &str) -> Result<Claims, MalformedToken> {
    let bytes = BASE64URL
        .decode(raw)
        .map_err(|source| MalformedToken::InvalidBase64 { segment, source })?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|source| MalformedToken::InvalidJson { segment, source })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MalformedToken::NotAnObject { segment }),
    }
}

fn encode_segment(claims: &Claims) -> String {
    // Serializing a `Map<String, Value>` cannot fail: keys are strings and
    // every `Value` is representable.
    let json = Value::Object(claims.clone()).to_string();
    BASE64URL.encode(json.as_bytes())
}
