//! Organization operations.
//!
//! | Method | Path | Auth | Operation |
//! |--------|------|------|-----------|
//! | POST   | `/api/v1/organization` | server | Create organization |
//! | PATCH  | `/api/v1/organization/{id}` | server | Update organization |
//! | GET    | `/api/v1/organizations?page={n}` | server | List organizations |
//! | GET    | `/api/v1/organization/{id}` | server | Get by ID |
//! | GET    | `/api/v1/organization/me` | caller | Organization of the token's user |

use reqwest::Method;

use crate::error::{require_id, require_non_empty, IdpError};
use crate::models::{Organization, PaginatedList};
use crate::session::{bearer, IdpRequest, IdpSession};

const ORGANIZATION_PATH: &str = "api/v1/organization";
const ORGANIZATIONS_PATH: &str = "api/v1/organizations";

impl IdpSession {
    /// Create an organization. Not idempotent: every call creates a new one.
    pub async fn create_organization(
        &self,
        organization: &Organization,
    ) -> Result<Organization, IdpError> {
        let request = IdpRequest::new(Method::POST, ORGANIZATION_PATH).json(organization)?;
        let created: Organization = self.send_as_server(request).await?;
        self.cache().remember_organization(&created);
        Ok(created)
    }

    /// Apply the set fields of `organization` to an existing organization.
    pub async fn update_organization(
        &self,
        organization_id: &str,
        organization: &Organization,
    ) -> Result<Organization, IdpError> {
        require_id(
            "updateOrganization",
            "Organization Id (string)",
            organization_id,
        )?;
        let request = IdpRequest::new(Method::PATCH, ORGANIZATION_PATH)
            .segment(organization_id)
            .json(organization)?;
        let updated: Organization = self.send_as_server(request).await?;
        self.cache().remember_organization(&updated);
        Ok(updated)
    }

    /// One page of organizations. Every entry is added to the scope cache.
    pub async fn list_organizations(
        &self,
        page: u32,
    ) -> Result<PaginatedList<Organization>, IdpError> {
        let request = IdpRequest::new(Method::GET, ORGANIZATIONS_PATH).query("page", page);
        let list: PaginatedList<Organization> = self.send_as_server(request).await?;
        for organization in &list.data {
            self.cache().remember_organization(organization);
        }
        Ok(list)
    }

    /// Fetch an organization, served from the scope cache when already seen.
    pub async fn get_organization(&self, organization_id: &str) -> Result<Organization, IdpError> {
        require_id(
            "getOrganization",
            "Organization Id (string)",
            organization_id,
        )?;
        if let Some(cached) = self.cache().organization(organization_id) {
            tracing::debug!(organization_id, "organization served from scope cache");
            return Ok(cached);
        }
        let request = IdpRequest::new(Method::GET, ORGANIZATION_PATH).segment(organization_id);
        let organization: Organization = self.send_as_server(request).await?;
        self.cache().remember_organization(&organization);
        Ok(organization)
    }

    /// Organization of the user owning `user_token`, authorized by that token.
    /// Bypasses the scope cache.
    pub async fn get_my_organization(&self, user_token: &str) -> Result<Organization, IdpError> {
        require_non_empty("getMyOrganization", "User Token (string)", user_token)?;
        let request = IdpRequest::new(Method::GET, ORGANIZATION_PATH).segment("me");
        self.send(request, Some(&bearer(user_token))).await
    }
}
