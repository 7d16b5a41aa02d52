//! Tenant identity and registry: the id newtype, registry records and the directory abstraction.

use crate::error::AppError;
use crate::validator::is_valid_tenant_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

/// Opaque tenant identifier. Syntax is checked by the validator, not on construction,
/// because header-supplied ids are carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        TenantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId(s)
    }
}

impl PartialEq<str> for TenantId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Row of `tenant_registry`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Storage schema; the tenant id is used when unset.
    pub database_schema: Option<String>,
    pub configuration: Option<serde_json::Value>,
    pub created_on: DateTime<Utc>,
    pub changed_on: DateTime<Utc>,
    pub created_by_fk: Option<i64>,
    pub changed_by_fk: Option<i64>,
}

impl TenantRecord {
    pub fn schema_name(&self) -> &str {
        self.database_schema
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.tenant_id.as_str())
    }
}

/// Payload for registering a tenant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTenant {
    pub tenant_id: String,
    pub tenant_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub database_schema: Option<String>,
    #[serde(default)]
    pub configuration: Option<serde_json::Value>,
}

impl NewTenant {
    pub fn named(tenant_id: impl Into<String>, tenant_name: impl Into<String>) -> Self {
        NewTenant {
            tenant_id: tenant_id.into(),
            tenant_name: tenant_name.into(),
            description: None,
            database_schema: None,
            configuration: None,
        }
    }

    /// Syntactic checks shared by every directory implementation.
    pub fn check(&self) -> Result<(), AppError> {
        if !is_valid_tenant_id(&self.tenant_id) {
            return Err(AppError::Validation(format!(
                "invalid tenant id '{}': expected 2-50 letters, digits, '-' or '_'",
                self.tenant_id
            )));
        }
        if self.tenant_name.trim().is_empty() {
            return Err(AppError::Validation("tenant_name is required".into()));
        }
        if let Some(schema) = self.database_schema.as_deref() {
            if !is_valid_tenant_id(schema) {
                return Err(AppError::Validation(format!("invalid database_schema '{}'", schema)));
            }
        }
        Ok(())
    }
}

/// Authoritative tenant registry. Implemented over Postgres by [`crate::store::PgTenantStore`].
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn get(&self, tenant_id: &str) -> Result<Option<TenantRecord>, AppError>;

    async fn list(&self, active_only: bool) -> Result<Vec<TenantRecord>, AppError>;

    async fn create(&self, tenant: NewTenant, actor: Option<i64>) -> Result<TenantRecord, AppError>;

    /// Soft delete: the record stays, flagged inactive.
    async fn deactivate(&self, tenant_id: &str, actor: Option<i64>) -> Result<TenantRecord, AppError>;

    async fn is_active(&self, tenant_id: &str) -> Result<bool, AppError> {
        Ok(self.get(tenant_id).await?.map(|t| t.is_active).unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// In-process registry. Thread-safe; no lock is held across an await.
#[derive(Default)]
pub struct MemoryTenantDirectory {
    by_id: RwLock<BTreeMap<String, TenantRecord>>,
}

impl MemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Internal("tenant directory lock poisoned".into())
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn get(&self, tenant_id: &str) -> Result<Option<TenantRecord>, AppError> {
        let by_id = self.by_id.read().map_err(|_| Self::poisoned())?;
        Ok(by_id.get(tenant_id).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<TenantRecord>, AppError> {
        let by_id = self.by_id.read().map_err(|_| Self::poisoned())?;
        Ok(by_id
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect())
    }

    async fn create(&self, tenant: NewTenant, actor: Option<i64>) -> Result<TenantRecord, AppError> {
        tenant.check()?;
        let mut by_id = self.by_id.write().map_err(|_| Self::poisoned())?;
        if by_id.contains_key(&tenant.tenant_id) {
            return Err(AppError::Conflict(format!("tenant already exists: {}", tenant.tenant_id)));
        }
        let now = Utc::now();
        let record = TenantRecord {
            tenant_id: TenantId::new(tenant.tenant_id.clone()),
            tenant_name: tenant.tenant_name,
            description: tenant.description,
            is_active: true,
            database_schema: tenant.database_schema,
            configuration: tenant.configuration,
            created_on: now,
            changed_on: now,
            created_by_fk: actor,
            changed_by_fk: actor,
        };
        by_id.insert(tenant.tenant_id, record.clone());
        Ok(record)
    }

    async fn deactivate(&self, tenant_id: &str, actor: Option<i64>) -> Result<TenantRecord, AppError> {
        let mut by_id = self.by_id.write().map_err(|_| Self::poisoned())?;
        let record = by_id
            .get_mut(tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant not found: {}", tenant_id)))?;
        record.is_active = false;
        record.changed_on = Utc::now();
        record.changed_by_fk = actor;
        Ok(record.clone())
    }
}
