//! Organization (tenant) lookups

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::Organization;

#[derive(Clone)]
pub struct OrganizationService {
    db: PgPool,
}

impl OrganizationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Organizations visible to a member of `organization_id`: only their own
    pub async fn list_visible(&self, organization_id: Uuid) -> AppResult<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(organizations)
    }

    pub async fn get(&self, organization_id: Uuid) -> AppResult<Organization> {
        sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization".to_string()))
    }
}
