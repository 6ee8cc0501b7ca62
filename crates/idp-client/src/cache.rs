//! Per-scope caches.
//!
//! A [`ScopeCache`] lives exactly as long as one scope (conventionally one
//! inbound request) and is never shared between scopes. It holds:
//!
//! - the server token slot, filled at most once and never refreshed, and
//! - id-keyed lookup caches for organizations and users fetched in the scope.
//!
//! Locks are `parking_lot` and are never held across an `.await`.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use crate::models::{AccessToken, Identified, Organization, User};

/// Scope-local state shared by every call made through one session.
#[derive(Debug, Default)]
pub struct ScopeCache {
    server_token: Mutex<Option<AccessToken>>,
    organizations: RwLock<HashMap<String, Organization>>,
    users: RwLock<HashMap<String, User>>,
}

impl ScopeCache {
    /// The cached server token, if the slot has been filled.
    pub fn server_token(&self) -> Option<AccessToken> {
        self.server_token.lock().clone()
    }

    /// Fill the server token slot unless a concurrent caller already did.
    ///
    /// Returns whichever token ends up in the slot, so racing callers in the
    /// same scope all observe one value.
    pub fn store_server_token(&self, token: AccessToken) -> AccessToken {
        self.server_token.lock().get_or_insert(token).clone()
    }

    /// Cached organization by IDP id.
    pub fn organization(&self, id: &str) -> Option<Organization> {
        self.organizations.read().get(id).cloned()
    }

    /// Insert or replace an organization. Entries without an id are skipped.
    pub fn remember_organization(&self, organization: &Organization) {
        remember(&self.organizations, organization);
    }

    /// Cached user by IDP id.
    pub fn user(&self, id: &str) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    /// Insert or replace a user.
    pub fn remember_user(&self, user: &User) {
        remember(&self.users, user);
    }
}

/// Entries without an id are skipped: there is nothing to key them by.
fn remember<T: Identified + Clone>(map: &RwLock<HashMap<String, T>>, item: &T) {
    if let Some(id) = item.id().filter(|id| !id.is_empty()) {
        map.write().insert(id.to_string(), item.clone());
    }
}
