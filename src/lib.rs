//! Tenant resolution and tenant-scoped authorization for a multi-tenant analytics backend.
//!
//! A request is resolved to at most one tenant (header, subdomain, identity claims, default),
//! the result is carried write-once in the request extensions, and every access decision on
//! databases, datasets, dashboards, charts and saved queries is gated on tenant match before
//! the base permission policy is consulted.

pub mod authz;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod principal;
pub mod qualifier;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod store;
pub mod tenant;
pub mod validator;

pub use authz::{tenant_check, AccessPolicy, AllowAll, ProtectedResource, ResourceKind, RolePolicy, TenantDecision, TenantGate};
pub use catalog::{MemoryCatalog, PgCatalog, ResourceCatalog};
pub use config::{load_from_file, validate, TenancyConfig};
pub use context::{ResolvedTenantContext, TenantScope, TenantSource};
pub use error::{AppError, ConfigError};
pub use extractors::CurrentTenant;
pub use middleware::resolve_tenant;
pub use migration::{apply_tenant_migration, revert_tenant_migration};
pub use principal::{ClaimSet, Principal, Role};
pub use qualifier::{cache_key, connect_tenant_pool, tenant_database_uri, tenant_filter, MemoryCacheBackend, TenantCache, TenantFilter};
pub use resolver::{RequestAttrs, TenantResolver};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app_router, common_routes, resource_routes, tenant_routes};
pub use state::AppState;
pub use store::PgTenantStore;
pub use tenant::{MemoryTenantDirectory, NewTenant, TenantDirectory, TenantId, TenantRecord};
pub use validator::{is_valid_tenant_id, TenantValidator};
