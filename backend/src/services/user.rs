//! User accounts within an organization

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::auth::{hash_password, verify_password};
use shared::models::{Role, User};

pub const USER_COLUMNS: &str = "id, organization_id, username, email, password_hash, country, \
                                currency, role, created_at, updated_at";

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// Input for an admin adding a user to their organization
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    pub currency: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Country cannot be empty"))]
    pub country: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

/// Check username, email and currency, naming the offending field
pub fn check_account_fields(username: &str, email: &str, currency: &str) -> AppResult<()> {
    shared::validate_username(username).map_err(|msg| AppError::invalid("username", msg))?;
    shared::validate_email(email).map_err(|msg| AppError::invalid("email", msg))?;
    shared::validate_currency(currency).map_err(|msg| AppError::invalid("currency", msg))?;
    Ok(())
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Profile of a user in the given organization
    pub async fn get(&self, organization_id: Uuid, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND organization_id = $2"
        ))
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// List the users of an organization
    pub async fn list(&self, organization_id: Uuid) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 ORDER BY created_at"
        ))
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Add a user to an organization
    pub async fn create(&self, organization_id: Uuid, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        check_account_fields(&input.username, &input.email, &input.currency)?;
        shared::validate_password(&input.password)
            .map_err(|msg| AppError::invalid("password", msg))?;

        let password_hash = hash_password(input.password).await?;
        let role = input.role.unwrap_or(Role::Manager);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (organization_id, username, email, password_hash, country, currency, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(&input.username)
        .bind(input.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(&input.country)
        .bind(&input.currency)
        .bind(role)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, role = %role, "Added user to organization");

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> AppResult<User> {
        input.validate()?;
        let existing = self.get(organization_id, user_id).await?;

        let username = input.username.unwrap_or(existing.username);
        let email = input
            .email
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(existing.email);
        let country = input.country.unwrap_or(existing.country);
        let currency = input.currency.unwrap_or(existing.currency);
        check_account_fields(&username, &email, &currency)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $1, email = $2, country = $3, currency = $4, updated_at = NOW()
            WHERE id = $5 AND organization_id = $6
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&username)
        .bind(&email)
        .bind(&country)
        .bind(&currency)
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn change_password(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        let existing = self.get(organization_id, user_id).await?;

        if !verify_password(input.old_password, existing.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        shared::validate_password(&input.new_password)
            .map_err(|msg| AppError::invalid("newPassword", msg))?;

        let password_hash = hash_password(input.new_password).await?;

        sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2 AND organization_id = $3",
        )
        .bind(&password_hash)
        .bind(user_id)
        .bind(organization_id)
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(())
    }
}
