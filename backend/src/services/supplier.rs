//! Supplier directory service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::Supplier;
use shared::types::double_option;

const SUPPLIER_COLUMNS: &str =
    "id, organization_id, name, contact_name, address, phone, email, created_at, updated_at";

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub contact_name: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50, message = "Phone is too long"))]
    pub phone: Option<String>,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub email: Option<String>,
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, organization_id: Uuid) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE organization_id = $1 ORDER BY name"
        ))
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, organization_id: Uuid, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND organization_id = $2"
        ))
        .bind(supplier_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        input: CreateSupplierInput,
    ) -> AppResult<Supplier> {
        input.validate()?;
        shared::validate_email(&input.email).map_err(|msg| AppError::invalid("email", msg))?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (organization_id, name, contact_name, address, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(input.name.trim())
        .bind(&input.contact_name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        input.validate()?;
        if let Some(Some(phone)) = &input.phone {
            if phone.chars().count() > 50 {
                return Err(AppError::invalid("phone", "Phone is too long"));
            }
        }
        let existing = self.get(organization_id, supplier_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let email = input.email.unwrap_or(existing.email);
        shared::validate_email(&email).map_err(|msg| AppError::invalid("email", msg))?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = $1, contact_name = $2, address = $3, phone = $4, email = $5,
                updated_at = NOW()
            WHERE id = $6 AND organization_id = $7
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(input.contact_name.unwrap_or(existing.contact_name))
        .bind(input.address.unwrap_or(existing.address))
        .bind(input.phone.unwrap_or(existing.phone))
        .bind(&email)
        .bind(supplier_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        Ok(supplier)
    }

    /// Delete a supplier; its items stay and lose the supplier reference
    pub async fn delete(&self, organization_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1 AND organization_id = $2")
            .bind(supplier_id)
            .bind(organization_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        tracing::info!(supplier_id = %supplier_id, "Supplier deleted");

        Ok(())
    }
}
