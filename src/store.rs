//! Postgres-backed tenant registry and database bootstrap.

use crate::error::AppError;
use crate::tenant::{NewTenant, TenantDirectory, TenantRecord};
use async_trait::async_trait;
use sqlx::PgPool;

pub const REGISTRY_TABLE: &str = "tenant_registry";

const RECORD_COLUMNS: &str = "tenant_id, tenant_name, description, is_active, database_schema, configuration, \
     created_on, changed_on, created_by_fk, changed_by_fk";

/// Tenant registry over the `tenant_registry` table created by [`crate::migration::apply_tenant_migration`].
#[derive(Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        PgTenantStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenantDirectory for PgTenantStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<TenantRecord>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE tenant_id = $1", RECORD_COLUMNS, REGISTRY_TABLE);
        let rec = sqlx::query_as::<_, TenantRecord>(&sql)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn list(&self, active_only: bool) -> Result<Vec<TenantRecord>, AppError> {
        let filter = if active_only { " WHERE is_active" } else { "" };
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY tenant_id",
            RECORD_COLUMNS, REGISTRY_TABLE, filter
        );
        let rows = sqlx::query_as::<_, TenantRecord>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn create(&self, tenant: NewTenant, actor: Option<i64>) -> Result<TenantRecord, AppError> {
        tenant.check()?;
        let schema = tenant
            .database_schema
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| tenant.tenant_id.clone());
        let sql = format!(
            "INSERT INTO {} (tenant_id, tenant_name, description, is_active, database_schema, configuration, \
             created_on, changed_on, created_by_fk, changed_by_fk) \
             VALUES ($1, $2, $3, TRUE, $4, $5, NOW(), NOW(), $6, $6) \
             ON CONFLICT (tenant_id) DO NOTHING RETURNING {}",
            REGISTRY_TABLE, RECORD_COLUMNS
        );
        let rec = sqlx::query_as::<_, TenantRecord>(&sql)
            .bind(&tenant.tenant_id)
            .bind(&tenant.tenant_name)
            .bind(&tenant.description)
            .bind(&schema)
            .bind(&tenant.configuration)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("tenant already exists: {}", tenant.tenant_id)))?;
        tracing::info!(tenant = %rec.tenant_id, schema = %schema, "registered tenant");
        Ok(rec)
    }

    async fn deactivate(&self, tenant_id: &str, actor: Option<i64>) -> Result<TenantRecord, AppError> {
        let sql = format!(
            "UPDATE {} SET is_active = FALSE, changed_on = NOW(), changed_by_fk = $2 \
             WHERE tenant_id = $1 RETURNING {}",
            REGISTRY_TABLE, RECORD_COLUMNS
        );
        let rec = sqlx::query_as::<_, TenantRecord>(&sql)
            .bind(tenant_id)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant not found: {}", tenant_id)))?;
        tracing::info!(tenant = %tenant_id, "deactivated tenant");
        Ok(rec)
    }

    async fn is_active(&self, tenant_id: &str) -> Result<bool, AppError> {
        let sql = format!("SELECT is_active FROM {} WHERE tenant_id = $1", REGISTRY_TABLE);
        let row: Option<(bool,)> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(active,)| active).unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_columns_match_record_fields() {
        for field in ["tenant_id", "tenant_name", "database_schema", "configuration", "changed_by_fk"] {
            assert!(RECORD_COLUMNS.contains(field));
        }
    }
}
