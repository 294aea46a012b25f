//! Company management service

use chrono::{DateTime, Utc};
use shared::{Company, CreateCompanyInput, UpdateCompanyInput};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Company service for managing tenant companies
#[derive(Clone)]
pub struct CompanyService {
    db: PgPool,
}

/// Row for company queries
#[derive(Debug, FromRow)]
struct CompanyRow {
    nit: String,
    name: String,
    address: String,
    phone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            nit: row.nit,
            name: row.name,
            address: row.address,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl CompanyService {
    /// Create a new CompanyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List companies ordered by name, optionally filtered by a name fragment
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Company>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT nit, name, address, phone, created_at, updated_at
            FROM companies
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    /// Get a company by NIT
    pub async fn get(&self, nit: &str) -> AppResult<Company> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT nit, name, address, phone, created_at, updated_at FROM companies WHERE nit = $1",
        )
        .bind(nit)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))?;

        Ok(row.into())
    }

    /// Register a company
    pub async fn create(&self, input: CreateCompanyInput) -> AppResult<Company> {
        input.validate()?;

        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (nit, name, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING nit, name, address, phone, created_at, updated_at
            "#,
        )
        .bind(&input.nit)
        .bind(input.name.trim())
        .bind(input.address.trim())
        .bind(input.phone.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "nit"))?;

        tracing::info!(nit = %row.nit, "Company created");
        Ok(row.into())
    }

    /// Update a company's details
    pub async fn update(&self, nit: &str, input: UpdateCompanyInput) -> AppResult<Company> {
        input.validate()?;
        let existing = self.get(nit).await?;

        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            UPDATE companies
            SET name = $1, address = $2, phone = $3, updated_at = NOW()
            WHERE nit = $4
            RETURNING nit, name, address, phone, created_at, updated_at
            "#,
        )
        .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(input.address.as_deref().map(str::trim).unwrap_or(&existing.address))
        .bind(input.phone.as_deref().map(str::trim).unwrap_or(&existing.phone))
        .bind(nit)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a company together with its products and inventory
    pub async fn delete(&self, nit: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE nit = $1")
            .bind(nit)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Company".to_string()));
        }

        tracing::info!(nit = %nit, "Company deleted");
        Ok(())
    }

    /// Check that a company exists
    pub async fn ensure_exists(&self, nit: &str) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE nit = $1)",
        )
        .bind(nit)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Company".to_string()));
        }
        Ok(())
    }
}
