//! Tenant-namespaced cache keys and per-tenant invalidation.

use crate::context::TenantScope;
use crate::error::AppError;
use async_trait::async_trait;
use moka::sync::Cache;
use serde_json::Value;
use std::sync::Arc;

/// `tenant:<tenant>:<base>` when a tenant is known, else `global:<base>`. The base key is never inspected.
pub fn cache_key(base_key: &str, tenant: Option<&str>) -> String {
    match tenant {
        Some(t) => format!("{}{}", tenant_prefix(t), base_key),
        None => format!("global:{}", base_key),
    }
}

/// Key for the scope's tenant, or for `tenant_override` when given.
pub fn scoped_cache_key(scope: &TenantScope, base_key: &str, tenant_override: Option<&str>) -> String {
    cache_key(base_key, tenant_override.or(scope.tenant_str()))
}

pub fn tenant_prefix(tenant: &str) -> String {
    format!("tenant:{}:", tenant)
}

/// Key/value cache as seen by this crate. Prefix deletion is an optional capability.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    fn prefix_deletion(&self) -> Option<&dyn PrefixDeletion> {
        None
    }
}

#[async_trait]
pub trait PrefixDeletion: Send + Sync {
    /// Removes every key starting with `prefix`; returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, AppError>;
}

/// Drops every entry namespaced to `tenant`. Backends that cannot enumerate by prefix are left untouched.
pub async fn invalidate_tenant(backend: &dyn CacheBackend, tenant: &str) -> Result<usize, AppError> {
    let Some(deleter) = backend.prefix_deletion() else {
        tracing::warn!(tenant = %tenant, "cache backend cannot delete by prefix; tenant cache not invalidated");
        return Ok(0);
    };
    let removed = deleter.delete_prefix(&tenant_prefix(tenant)).await?;
    tracing::info!(tenant = %tenant, removed, "cleared tenant cache entries");
    Ok(removed)
}

/// Cache facade that namespaces every key by tenant.
#[derive(Clone)]
pub struct TenantCache {
    backend: Arc<dyn CacheBackend>,
}

impl TenantCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        TenantCache { backend }
    }

    pub async fn get(&self, scope: &TenantScope, base_key: &str) -> Result<Option<Value>, AppError> {
        self.backend.get(&scoped_cache_key(scope, base_key, None)).await
    }

    pub async fn set(&self, scope: &TenantScope, base_key: &str, value: Value) -> Result<(), AppError> {
        self.backend.set(&scoped_cache_key(scope, base_key, None), value).await
    }

    pub async fn delete(&self, scope: &TenantScope, base_key: &str) -> Result<(), AppError> {
        self.backend.delete(&scoped_cache_key(scope, base_key, None)).await
    }

    pub async fn invalidate_tenant(&self, tenant: &str) -> Result<usize, AppError> {
        invalidate_tenant(self.backend.as_ref(), tenant).await
    }
}

/// In-process cache with prefix deletion.
#[derive(Clone)]
pub struct MemoryCacheBackend {
    cache: Cache<String, Value>,
}

impl MemoryCacheBackend {
    pub fn new(max_entries: u64) -> Self {
        MemoryCacheBackend {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.cache.get(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        self.cache.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.cache.invalidate(key);
        Ok(())
    }

    fn prefix_deletion(&self) -> Option<&dyn PrefixDeletion> {
        Some(self)
    }
}

#[async_trait]
impl PrefixDeletion for MemoryCacheBackend {
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, AppError> {
        let keys: Vec<Arc<String>> = self
            .cache
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k)
            .collect();
        for key in &keys {
            self.cache.invalidate(key.as_str());
        }
        Ok(keys.len())
    }
}
