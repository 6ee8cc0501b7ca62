//! IDP client error types.
//!
//! One variant per failure kind. Configuration and argument errors are raised
//! before any I/O; transport and remote-status errors after the attempted call.
//! None of them is retried by this crate.

use serde_json::Value;

/// Boxed cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from IDP calls.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// A required setting is absent. Raised before any network call.
    #[error("missing '{option}' configuration option; set it on IdpConfig or via the IDP_* environment variables")]
    MissingConfiguration { option: &'static str },

    /// The caller passed an empty identifier or token. Raised before any
    /// network call.
    #[error("invalid argument supplied to {operation}: expected {expected}, got '{actual}'")]
    InvalidArgument {
        operation: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// The call could not be completed (DNS, TLS, timeout, reset).
    #[error("could not complete IDP request {endpoint}: {source}")]
    Transport { endpoint: String, source: BoxError },

    /// The IDP answered with a non-2xx status.
    #[error("IDP {endpoint} returned {status}: [{}]", .messages.join("; "))]
    RemoteStatus {
        endpoint: String,
        status: u16,
        messages: Vec<String>,
    },

    /// A request body could not be encoded.
    #[error("failed to serialize request body for {endpoint}: {source}")]
    Serialization {
        endpoint: String,
        source: serde_json::Error,
    },

    /// A 2xx response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl IdpError {
    /// HTTP status of a [`RemoteStatus`](Self::RemoteStatus) error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied messages of a [`RemoteStatus`](Self::RemoteStatus)
    /// error; empty for every other kind.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::RemoteStatus { messages, .. } => messages,
            _ => &[],
        }
    }

    pub(crate) fn invalid_argument(
        operation: &'static str,
        expected: &'static str,
        actual: &str,
    ) -> Self {
        Self::InvalidArgument {
            operation,
            expected,
            actual: actual.to_string(),
        }
    }
}

/// Reject an empty (or whitespace-only) identifier before any I/O.
pub(crate) fn require_non_empty(
    operation: &'static str,
    expected: &'static str,
    value: &str,
) -> Result<(), IdpError> {
    if value.trim().is_empty() {
        Err(IdpError::invalid_argument(operation, expected, value))
    } else {
        Ok(())
    }
}

/// Reject an identifier that cannot stand as a single path segment: blank,
/// `.` or `..`. URL building drops dot segments, which would retarget the call.
pub(crate) fn require_id(
    operation: &'static str,
    expected: &'static str,
    value: &str,
) -> Result<(), IdpError> {
    require_non_empty(operation, expected, value)?;
    if matches!(value, "." | "..") {
        Err(IdpError::invalid_argument(operation, expected, value))
    } else {
        Ok(())
    }
}

/// Extract the `message` field of an error body.
///
/// A string becomes a one-element list, an array keeps its string entries in
/// order, and anything else (including an empty or non-JSON body) yields an
/// empty list.
pub(crate) fn messages_from_body(body: &[u8]) -> Vec<String> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };
    match value.get("message") {
        Some(Value::String(message)) => vec![message.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
