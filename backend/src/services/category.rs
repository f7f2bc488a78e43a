//! Category management service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::Category;
use shared::types::double_option;

const CATEGORY_COLUMNS: &str = "id, organization_id, name, description, created_at, updated_at";

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, organization_id: Uuid) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE organization_id = $1 ORDER BY name"
        ))
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    pub async fn get(&self, organization_id: Uuid, category_id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND organization_id = $2"
        ))
        .bind(category_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        input: CreateCategoryInput,
    ) -> AppResult<Category> {
        input.validate()?;
        shared::validate_name(&input.name).map_err(|msg| AppError::invalid("name", msg))?;

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (organization_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<Category> {
        input.validate()?;
        let existing = self.get(organization_id, category_id).await?;

        let name = input.name.unwrap_or(existing.name);
        shared::validate_name(&name).map_err(|msg| AppError::invalid("name", msg))?;
        let description = input.description.unwrap_or(existing.description);

        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3 AND organization_id = $4
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(&description)
        .bind(category_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// Delete a category that no item uses
    pub async fn delete(&self, organization_id: Uuid, category_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE category_id = $1 AND organization_id = $2)",
        )
        .bind(category_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: "Category is still used by items".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND organization_id = $2")
            .bind(category_id)
            .bind(organization_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }
}
