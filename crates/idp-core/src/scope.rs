//! # Scope Requirements
//!
//! A [`ScopeRequirement`] names the permission scopes a request must carry and
//! whether *any* or *all* of them are needed. Evaluation reads the `scopes`
//! claim of a [`DecodedToken`] and never touches the network.
//!
//! An empty requirement is rejected at construction: under "any-of" it could
//! never match and under "all-of" it would match every token, and neither is
//! a sensible gate.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ScopeConfigError;
use crate::token::DecodedToken;

/// Name of the payload claim holding the granted scopes.
pub const SCOPES_CLAIM: &str = "scopes";

/// How a list of required scopes is matched against a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeMode {
    /// At least one required scope must be granted.
    Any,
    /// Every required scope must be granted.
    All,
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Why a token failed a scope requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDenied {
    /// The payload has no `scopes` claim.
    MissingClaim,
    /// The `scopes` claim is not an array of strings.
    InvalidClaim,
    /// The claim is well-formed but does not satisfy the requirement.
    Insufficient,
}

impl fmt::Display for ScopeDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingClaim => write!(f, "token has no '{SCOPES_CLAIM}' claim"),
            Self::InvalidClaim => {
                write!(f, "token '{SCOPES_CLAIM}' claim is not a list of strings")
            }
            Self::Insufficient => write!(f, "token does not carry the required scopes"),
        }
    }
}

/// A non-empty list of required scopes plus a matching mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRequirement {
    mode: ScopeMode,
    scopes: Vec<String>,
}

impl ScopeRequirement {
    /// Build a requirement. Fails on an empty list or a blank scope name.
    ///
    /// Order is preserved (it is used in rejection messages); duplicates are
    /// dropped.
    pub fn new<I, S>(mode: ScopeMode, scopes: I) -> Result<Self, ScopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut list = Vec::new();
        for scope in scopes {
            let scope = scope.into();
            if scope.trim().is_empty() {
                return Err(ScopeConfigError::BlankScope);
            }
            if seen.insert(scope.clone()) {
                list.push(scope);
            }
        }
        if list.is_empty() {
            return Err(ScopeConfigError::Empty);
        }
        Ok(Self { mode, scopes: list })
    }

    /// Shorthand for [`ScopeMode::Any`].
    pub fn any<I, S>(scopes: I) -> Result<Self, ScopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ScopeMode::Any, scopes)
    }

    /// Shorthand for [`ScopeMode::All`].
    pub fn all<I, S>(scopes: I) -> Result<Self, ScopeConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ScopeMode::All, scopes)
    }

    /// The matching mode.
    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// The required scopes, in declaration order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Check a set of granted scopes against this requirement.
    pub fn is_satisfied_by<'a, I>(&self, granted: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let granted: BTreeSet<&str> = granted.into_iter().collect();
        match self.mode {
            ScopeMode::Any => self.scopes.iter().any(|s| granted.contains(s.as_str())),
            ScopeMode::All => self.scopes.iter().all(|s| granted.contains(s.as_str())),
        }
    }

    /// Check a decoded token's `scopes` claim against this requirement.
    pub fn evaluate(&self, token: &DecodedToken) -> Result<(), ScopeDenied> {
        let granted = granted_scopes(token)?;
        if self.is_satisfied_by(granted) {
            Ok(())
        } else {
            Err(ScopeDenied::Insufficient)
        }
    }

    /// Human-readable statement of the requirement, used as a rejection reason.
    pub fn describe(&self) -> String {
        let list = self.scopes.join(", ");
        match self.mode {
            ScopeMode::Any => format!("One of the following scopes is required: {list}"),
            ScopeMode::All => format!("All of the following scopes are required: {list}"),
        }
    }
}

/// Read the `scopes` claim as a set of strings.
pub fn granted_scopes(token: &DecodedToken) -> Result<BTreeSet<&str>, ScopeDenied> {
    let claim = token.claim(SCOPES_CLAIM).ok_or(ScopeDenied::MissingClaim)?;
    let items = claim.as_array().ok_or(ScopeDenied::InvalidClaim)?;
    items
        .iter()
        .map(|v| v.as_str().ok_or(ScopeDenied::InvalidClaim))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{decode, encode};
    use serde_json::{json, Value};

    fn token_with(payload: Value) -> DecodedToken {
        let header = match json!({"alg": "none"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let payload = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        decode(&encode(&header, &payload)).unwrap()
    }

    #[test]
    fn any_mode_accepts_on_single_overlap() {
        let req = ScopeRequirement::any(["a", "b"]).unwrap();
        let token = token_with(json!({"scopes": ["b", "c"]}));
        assert_eq!(req.evaluate(&token), Ok(()));
    }

    #[test]
    fn all_mode_rejects_on_partial_overlap() {
        let req = ScopeRequirement::all(["a", "b"]).unwrap();
        let token = token_with(json!({"scopes": ["b", "c"]}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::Insufficient));
    }

    #[test]
    fn all_mode_accepts_superset() {
        let req = ScopeRequirement::all(["a", "b"]).unwrap();
        let token = token_with(json!({"scopes": ["c", "b", "a"]}));
        assert_eq!(req.evaluate(&token), Ok(()));
    }

    #[test]
    fn any_mode_rejects_disjoint_scopes() {
        let req = ScopeRequirement::any(["a"]).unwrap();
        let token = token_with(json!({"scopes": ["b"]}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::Insufficient));
    }

    #[test]
    fn empty_granted_list_rejects() {
        let req = ScopeRequirement::any(["a"]).unwrap();
        let token = token_with(json!({"scopes": []}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::Insufficient));
    }

    #[test]
    fn missing_claim_rejects() {
        let req = ScopeRequirement::any(["a"]).unwrap();
        let token = token_with(json!({"sub": "USR-1"}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::MissingClaim));
    }

    #[test]
    fn non_array_claim_rejects() {
        let req = ScopeRequirement::any(["a"]).unwrap();
        let token = token_with(json!({"scopes": "a"}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::InvalidClaim));
    }

    #[test]
    fn mixed_type_claim_rejects() {
        let req = ScopeRequirement::any(["a"]).unwrap();
        let token = token_with(json!({"scopes": ["a", 7]}));
        assert_eq!(req.evaluate(&token), Err(ScopeDenied::InvalidClaim));
    }

    #[test]
    fn empty_requirement_is_a_configuration_error() {
        let none: [&str; 0] = [];
        assert_eq!(
            ScopeRequirement::any(none).unwrap_err(),
            ScopeConfigError::Empty
        );
        assert_eq!(
            ScopeRequirement::all(none).unwrap_err(),
            ScopeConfigError::Empty
        );
    }

    #[test]
    fn blank_scope_is_a_configuration_error() {
        assert_eq!(
            ScopeRequirement::all(["a", " "]).unwrap_err(),
            ScopeConfigError::BlankScope
        );
    }

    #[test]
    fn duplicates_are_dropped_and_order_kept() {
        let req = ScopeRequirement::all(["b", "a", "b"]).unwrap();
        assert_eq!(req.scopes(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn describe_lists_required_scopes() {
        let any = ScopeRequirement::any(["orgs:read", "orgs:write"]).unwrap();
        let all = ScopeRequirement::all(["orgs:read", "orgs:write"]).unwrap();
        assert_eq!(
            any.describe(),
            "One of the following scopes is required: orgs:read, orgs:write"
        );
        assert_eq!(
            all.describe(),
            "All of the following scopes are required: orgs:read, orgs:write"
        );
    }
}
