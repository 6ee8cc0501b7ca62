//! Request/response types matching the IDP API schemas.
//!
//! Resource fields are all optional: the same struct is used for outgoing
//! writes (where unset fields are omitted from the body) and for incoming
//! responses. Unknown response fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Timestamps ----------------------------------------------------------------

/// The IDP emits both RFC 3339 (`2021-03-04T05:06:07.000000Z`) and plain
/// `Y-m-d H:i:s` timestamps. Naive values are read as UTC; anything else
/// becomes `None` rather than failing the whole response.
mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub(super) fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc())
    }
}

// -- Access tokens -------------------------------------------------------------

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access token issued by the IDP, either to this service (client-credentials
/// exchange) or on behalf of a user (dev token, impersonation).
///
/// Immutable once constructed. Custom `Debug` redacts the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    access_token: String,
}

impl AccessToken {
    /// A bearer token with the given lifetime in seconds.
    pub fn bearer(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            token_type: default_token_type(),
            expires_in,
            access_token: access_token.into(),
        }
    }

    /// Token type, `"Bearer"` unless the IDP said otherwise.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime in seconds as reported at issue time.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// The raw token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Value for an `Authorization` header, e.g. `Bearer eyJ...`.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// -- Resources -----------------------------------------------------------------

/// Organization on the IDP server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_hosted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// User on the IDP server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Organizations the user belongs to, as returned by the IDP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizations: Option<Vec<serde_json::Value>>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login_time: Option<DateTime<Utc>>,
}

/// Resources that carry an IDP identifier and can sit in a lookup cache.
pub trait Identified {
    /// The IDP id, if the server returned one.
    fn id(&self) -> Option<&str>;
}

impl Identified for Organization {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Identified for User {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

// -- Pagination ----------------------------------------------------------------

/// One page of a list endpoint. `data` is typed to the requested resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub first_page_url: Option<String>,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub prev_page_url: Option<String>,
    #[serde(default)]
    pub last_page_url: Option<String>,
    #[serde(default)]
    pub per_page: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub last_page: Option<u64>,
}

impl<T> PaginatedList<T> {
    /// Whether the server advertised a further page.
    pub fn has_next_page(&self) -> bool {
        self.next_page_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_token_defaults_to_bearer() {
        let token: AccessToken =
            serde_json::from_value(json!({"access_token": "abc", "expires_in": 60})).unwrap();
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.expires_in(), 60);
        assert_eq!(token.header_value(), "Bearer abc");
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::bearer("very-secret", 60);
        assert!(!format!("{token:?}").contains("very-secret"));
    }

    #[test]
    fn unset_fields_are_omitted_from_write_bodies() {
        let org = Organization {
            name: Some("Acme".into()),
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&org).unwrap(),
            json!({"name": "Acme", "active": true})
        );
    }

    #[test]
    fn unknown_response_fields_are_ignored() {
        let user: User = serde_json::from_value(json!({
            "id": "USR-1",
            "email": "a@example.com",
            "created_at": "2021-03-04T05:06:07.000000Z",
            "organizations": [{"id": "ORG-1"}],
            "something_new": 42
        }))
        .unwrap();
        assert_eq!(user.id(), Some("USR-1"));
        assert_eq!(user.organizations.as_ref().map(Vec::len), Some(1));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn timestamps_accept_rfc3339_and_plain_formats() {
        let user: User = serde_json::from_value(json!({
            "id": "USR-1",
            "created_at": "2021-03-04 05:06:07",
            "updated_at": "2021-03-04T05:06:07.000000Z",
            "last_login_time": null
        }))
        .unwrap();
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(
            user.created_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2021-03-04T05:06:07+00:00")
        );
        assert!(user.last_login_time.is_none());
    }

    #[test]
    fn unrecognized_timestamps_do_not_fail_the_resource() {
        let org: Organization = serde_json::from_value(json!({
            "id": "ORG-1",
            "created_at": "last tuesday",
            "updated_at": "2021-03-04"
        }))
        .unwrap();
        assert_eq!(org.id(), Some("ORG-1"));
        assert!(org.created_at.is_none());
        assert_eq!(
            org.updated_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2021-03-04T00:00:00+00:00")
        );
    }

    #[test]
    fn paginated_list_types_its_data() {
        let page: PaginatedList<Organization> = serde_json::from_value(json!({
            "data": [{"id": "ORG-1", "name": "Acme"}, {"id": "ORG-2"}],
            "path": "http://idp.test/api/v1/organizations",
            "per_page": 15,
            "total": 2,
            "from": 1,
            "to": 2,
            "current_page": 1,
            "last_page": 1,
            "next_page_url": null
        }))
        .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].name.as_deref(), Some("Acme"));
        assert!(!page.has_next_page());
    }
}
