//! Tenancy settings. Every field has a default so a partial JSON file or an empty environment still loads.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-ID";
pub const DEFAULT_IMPERSONATION_HEADER: &str = "X-Impersonate-Tenant";
pub const DEFAULT_FALLBACK_SCHEMA: &str = "public";

/// Capacity of the syntactic-validation memo. Least-recently-used entries are evicted beyond it.
pub const VALIDATION_CACHE_CAPACITY: u64 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TenancyConfig {
    /// Request header carrying an explicit tenant id.
    pub tenant_header: String,
    /// Resolve tenants from the leftmost host label (`acme.example.com`).
    pub enable_subdomain_routing: bool,
    /// Used when no other signal yields a tenant.
    pub default_tenant_id: Option<String>,
    /// Admin-only header that scopes an admin to one tenant for the rest of the decision.
    pub impersonation_header: String,
    /// When set, a non-admin request without a tenant is denied instead of falling through.
    pub strict_mode: bool,
    /// When set, bulk listings also return rows with no tenant label.
    pub listings_include_unscoped: bool,
    pub validation_cache_capacity: u64,
    /// Schema searched after the tenant schema.
    pub search_path_fallback_schema: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        TenancyConfig {
            tenant_header: DEFAULT_TENANT_HEADER.into(),
            enable_subdomain_routing: false,
            default_tenant_id: None,
            impersonation_header: DEFAULT_IMPERSONATION_HEADER.into(),
            strict_mode: false,
            listings_include_unscoped: false,
            validation_cache_capacity: VALIDATION_CACHE_CAPACITY,
            search_path_fallback_schema: DEFAULT_FALLBACK_SCHEMA.into(),
        }
    }
}
