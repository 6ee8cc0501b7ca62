//! User operations.
//!
//! | Method | Path | Auth | Operation |
//! |--------|------|------|-----------|
//! | POST   | `/api/v1/user` | server | Register user |
//! | GET    | `/api/v1/users?page={n}` | server | List users |
//! | GET    | `/api/v1/user/{id}` | server | Get by ID |
//! | DELETE | `/api/v1/user/{id}` | server | Delete user |
//! | PATCH  | `/api/v1/user/{id}/organization` | server | Associate with this client's organization |
//! | POST   | `/api/v1/user/organization/token` | server | Associate the owner of a user token |
//! | GET    | `/api/v1/user/{id}/token` | server | Development token for a user |
//! | POST   | `/api/v1/user/token` | server or caller | Validate a user token |
//! | POST   | `/api/v1/user/{id}/impersonate` | server | Impersonate a user |

use reqwest::Method;
use serde::Serialize;

use crate::error::{require_id, require_non_empty, IdpError};
use crate::models::{AccessToken, PaginatedList, User};
use crate::session::{bearer, IdpRequest, IdpSession};

const USER_PATH: &str = "api/v1/user";
const USERS_PATH: &str = "api/v1/users";

#[derive(Serialize)]
struct AccessTokenBody<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
struct ImpersonationBody<'a> {
    requesting_access_token: &'a str,
}

impl IdpSession {
    /// Register a new user. Not idempotent.
    pub async fn register_user(&self, user: &User) -> Result<User, IdpError> {
        let request = IdpRequest::new(Method::POST, USER_PATH).json(user)?;
        let created: User = self.send_as_server(request).await?;
        self.cache().remember_user(&created);
        Ok(created)
    }

    /// One page of users. Every entry is added to the scope cache.
    pub async fn list_users(&self, page: u32) -> Result<PaginatedList<User>, IdpError> {
        let request = IdpRequest::new(Method::GET, USERS_PATH).query("page", page);
        let list: PaginatedList<User> = self.send_as_server(request).await?;
        for user in &list.data {
            self.cache().remember_user(user);
        }
        Ok(list)
    }

    /// Fetch a user, served from the scope cache when already seen.
    pub async fn get_user(&self, user_id: &str) -> Result<User, IdpError> {
        require_id("getUser", "User Id (string)", user_id)?;
        if let Some(cached) = self.cache().user(user_id) {
            tracing::debug!(user_id, "user served from scope cache");
            return Ok(cached);
        }
        let request = IdpRequest::new(Method::GET, USER_PATH).segment(user_id);
        let user: User = self.send_as_server(request).await?;
        self.cache().remember_user(&user);
        Ok(user)
    }

    /// Delete a user. A cached copy in this scope is left in place.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), IdpError> {
        require_id("deleteUser", "User Id (string)", user_id)?;
        let request = IdpRequest::new(Method::DELETE, USER_PATH).segment(user_id);
        self.send_as_server_without_body(request).await
    }

    /// Associate a user with the organization this client authenticates as.
    /// The returned user replaces any cached copy.
    pub async fn associate_user(&self, user_id: &str) -> Result<User, IdpError> {
        require_id("associateUser", "User Id (string)", user_id)?;
        let request = IdpRequest::new(Method::PATCH, USER_PATH)
            .segment(user_id)
            .segment("organization");
        let user: User = self.send_as_server(request).await?;
        self.cache().remember_user(&user);
        Ok(user)
    }

    /// Associate the owner of `user_token` with this client's organization.
    ///
    /// The token is validated first; the association call is only made when
    /// validation succeeds.
    pub async fn associate_user_token(&self, user_token: &str) -> Result<User, IdpError> {
        require_non_empty("associateUserToken", "User Token (string)", user_token)?;
        self.validate_user_token(user_token, None).await?;
        let request = IdpRequest::new(Method::POST, USER_PATH)
            .segment("organization")
            .segment("token")
            .json(&AccessTokenBody {
                access_token: user_token,
            })?;
        let user: User = self.send_as_server(request).await?;
        self.cache().remember_user(&user);
        Ok(user)
    }

    /// Issue a token for a user without their credentials. Development only.
    pub async fn get_dev_user_token(&self, user_id: &str) -> Result<AccessToken, IdpError> {
        require_id("getDevUserToken", "User Id (string)", user_id)?;
        let request = IdpRequest::new(Method::GET, USER_PATH)
            .segment(user_id)
            .segment("token");
        self.send_as_server(request).await
    }

    /// Check `user_token` with the IDP and return the user it belongs to.
    ///
    /// `authority` is a bearer token to validate with; `None` uses this
    /// scope's server token.
    pub async fn validate_user_token(
        &self,
        user_token: &str,
        authority: Option<&str>,
    ) -> Result<User, IdpError> {
        require_non_empty("validateUserToken", "User Token (string)", user_token)?;
        let request = IdpRequest::new(Method::POST, USER_PATH)
            .segment("token")
            .json(&AccessTokenBody {
                access_token: user_token,
            })?;
        match authority {
            Some(authority) => {
                require_non_empty("validateUserToken", "Authority Token (string)", authority)?;
                self.send(request, Some(&bearer(authority))).await
            }
            None => self.send_as_server(request).await,
        }
    }

    /// Obtain a token acting as `user_id`, on behalf of the holder of
    /// `requesting_token`.
    pub async fn impersonate_user(
        &self,
        user_id: &str,
        requesting_token: &str,
    ) -> Result<AccessToken, IdpError> {
        require_id("impersonateUser", "User Id (string)", user_id)?;
        require_non_empty(
            "impersonateUser",
            "Requesting Access Token (string)",
            requesting_token,
        )?;
        let request = IdpRequest::new(Method::POST, USER_PATH)
            .segment(user_id)
            .segment("impersonate")
            .json(&ImpersonationBody {
                requesting_access_token: requesting_token,
            })?;
        self.send_as_server(request).await
    }
}
