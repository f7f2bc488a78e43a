//! Authentication service for registration, login and token handling

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::services::user::{check_account_fields, UserService, USER_COLUMNS};
use shared::models::{Role, User};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new organization with its first admin
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "Organization name is required"))]
    pub organization_name: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    pub currency: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token handed back after registration or login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Create a new organization and its first user, who becomes its admin
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        input.validate()?;
        check_account_fields(&input.username, &input.email, &input.currency)?;
        shared::validate_password(&input.password)
            .map_err(|msg| AppError::invalid("password", msg))?;

        let password_hash = hash_password(input.password).await?;

        let mut tx = self.db.begin().await?;

        let organization_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO organizations (name) VALUES ($1) RETURNING id",
        )
        .bind(input.organization_name.trim())
        .fetch_one(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (organization_id, username, email, password_hash, country, currency, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(&input.username)
        .bind(input.email.to_lowercase())
        .bind(&password_hash)
        .bind(&input.country)
        .bind(&input.currency)
        .bind(Role::Admin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            organization_id = %organization_id,
            user_id = %user.id,
            "Registered organization"
        );

        self.respond_with_token(user)
    }

    /// Authenticate with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        input.validate()?;

        let user = UserService::new(self.db.clone())
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(input.password, user.password_hash.clone()).await? {
            return Err(AppError::InvalidCredentials);
        }

        self.respond_with_token(user)
    }

    /// Resolve the principal behind a bearer token.
    ///
    /// The user is reloaded so a deleted account or a changed role takes
    /// effect immediately.
    pub async fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = UserService::new(self.db.clone())
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        resolve_principal(&claims, &user)
    }

    fn respond_with_token(&self, user: User) -> AppResult<AuthResponse> {
        let token = issue_token(&self.jwt_secret, self.access_token_expiry, &user)?;
        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }
}

/// Sign an access token for the user
pub fn issue_token(secret: &str, ttl_seconds: i64, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        organization_id: user.organization_id,
        role: user.role,
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature and expiry of an access token
pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Build the request principal; the organization always comes from the
/// stored user and must agree with the token.
pub fn resolve_principal(claims: &Claims, user: &User) -> AppResult<AuthUser> {
    if claims.sub != user.id || claims.organization_id != user.organization_id {
        return Err(AppError::InvalidToken);
    }
    Ok(AuthUser {
        user_id: user.id,
        organization_id: user.organization_id,
        role: user.role,
    })
}

pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
