//! Organization handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::OrganizationService;
use crate::AppState;
use shared::models::{Capability, Organization};

/// Organizations visible to the caller (their own)
pub async fn list_organizations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Organization>>> {
    current_user.0.require(Capability::ListOrganizations)?;
    let service = OrganizationService::new(state.db);
    let organizations = service
        .list_visible(current_user.0.organization_id)
        .await?;
    Ok(Json(organizations))
}

/// The caller's organization
pub async fn get_my_organization(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Organization>> {
    let service = OrganizationService::new(state.db);
    let organization = service.get(current_user.0.organization_id).await?;
    Ok(Json(organization))
}
