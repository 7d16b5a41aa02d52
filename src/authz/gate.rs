//! The tenant gate: a tenant-match pre-check composed in front of the base access policy.
//!
//! | tenant in scope | resource label | outcome                                   |
//! |-----------------|----------------|-------------------------------------------|
//! | none            | any            | base policy decides (admins see all)      |
//! | X               | none           | base policy decides (unscoped resource)   |
//! | X               | X              | base policy decides                       |
//! | X               | Y != X         | denied, base policy not consulted         |
//!
//! With strict mode on, a non-admin without a tenant is denied outright.

use crate::authz::{Chart, Dashboard, Database, Datasource, ProtectedResource, ResourceKind, ResourceRow, SavedQuery};
use crate::catalog::ResourceCatalog;
use crate::context::TenantScope;
use crate::error::AppError;
use crate::principal::Role;
use crate::qualifier::{tenant_filter, ResourceTable};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of the tenant pre-check alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TenantDecision {
    /// No tenant in scope; isolation does not apply.
    NotApplicable,
    Allow,
    Deny,
}

/// The non-tenant permission logic the gate delegates to.
pub trait AccessPolicy: Send + Sync {
    fn can_access(&self, scope: &TenantScope, resource: &dyn ProtectedResource) -> bool;

    fn raise_for_access(&self, scope: &TenantScope, resource: &dyn ProtectedResource) -> Result<(), AppError> {
        if self.can_access(scope, resource) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} {} requires additional permissions",
                resource.kind(),
                resource.resource_id()
            )))
        }
    }

    /// Subset of `names` (tables in `database`) the caller may query.
    fn datasources_accessible_by_user(&self, _scope: &TenantScope, _database: &Database, names: Vec<String>) -> Vec<String> {
        names
    }
}

/// Grants everything; tenant isolation is then the only restriction.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_access(&self, _scope: &TenantScope, _resource: &dyn ProtectedResource) -> bool {
        true
    }
}

/// Admins reach every kind; standard users only the listed kinds; anonymous callers nothing.
#[derive(Clone, Debug)]
pub struct RolePolicy {
    standard_kinds: HashSet<ResourceKind>,
}

impl RolePolicy {
    pub fn new(standard_kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        RolePolicy {
            standard_kinds: standard_kinds.into_iter().collect(),
        }
    }
}

impl AccessPolicy for RolePolicy {
    fn can_access(&self, scope: &TenantScope, resource: &dyn ProtectedResource) -> bool {
        match scope.principal().map(|p| p.role) {
            Some(Role::Admin) => true,
            Some(Role::Standard) => self.standard_kinds.contains(&resource.kind()),
            None => false,
        }
    }
}

/// Tenant-match check only. A datasource is also denied when its owning database belongs elsewhere.
pub fn tenant_check(scope: &TenantScope, resource: &dyn ProtectedResource) -> TenantDecision {
    if scope.denies_unscoped_caller() {
        return TenantDecision::Deny;
    }
    let Some(tenant) = scope.tenant() else {
        return TenantDecision::NotApplicable;
    };
    let label = resource.tenant_labeled().and_then(|l| l.tenant_label());
    if let Some(label) = label {
        if label != tenant.as_str() {
            return TenantDecision::Deny;
        }
    }
    if let Some(owner) = resource.owning_database() {
        if tenant_check(scope, owner) == TenantDecision::Deny {
            return TenantDecision::Deny;
        }
    }
    TenantDecision::Allow
}

#[derive(Clone)]
pub struct TenantGate {
    policy: Arc<dyn AccessPolicy>,
    listings_include_unscoped: bool,
}

impl TenantGate {
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        TenantGate {
            policy,
            listings_include_unscoped: false,
        }
    }

    pub fn with_unscoped_listings(mut self, include: bool) -> Self {
        self.listings_include_unscoped = include;
        self
    }

    pub fn can_access(&self, scope: &TenantScope, resource: &dyn ProtectedResource) -> bool {
        if tenant_check(scope, resource) == TenantDecision::Deny {
            tracing::debug!(
                kind = %resource.kind(),
                id = %resource.resource_id(),
                "tenant isolation denied access"
            );
            return false;
        }
        self.policy.can_access(scope, resource)
    }

    pub fn can_access_database(&self, scope: &TenantScope, database: &Database) -> bool {
        self.can_access(scope, database)
    }

    pub fn can_access_datasource(&self, scope: &TenantScope, datasource: &Datasource) -> bool {
        self.can_access(scope, datasource)
    }

    pub fn can_access_dashboard(&self, scope: &TenantScope, dashboard: &Dashboard) -> bool {
        self.can_access(scope, dashboard)
    }

    pub fn can_access_chart(&self, scope: &TenantScope, chart: &Chart) -> bool {
        self.can_access(scope, chart)
    }

    pub fn can_access_saved_query(&self, scope: &TenantScope, query: &SavedQuery) -> bool {
        self.can_access(scope, query)
    }

    /// Named-resource check. A tenant mismatch is [`AppError::AccessDenied`]; otherwise the base policy decides.
    pub fn raise_for_access(&self, scope: &TenantScope, resource: &dyn ProtectedResource) -> Result<(), AppError> {
        if tenant_check(scope, resource) == TenantDecision::Deny {
            tracing::warn!(
                kind = %resource.kind(),
                id = %resource.resource_id(),
                tenant = scope.tenant_str().unwrap_or("none"),
                "tenant isolation denied access"
            );
            return Err(AppError::access_denied(resource.kind(), resource.resource_id()));
        }
        self.policy.raise_for_access(scope, resource)
    }

    /// Tables of `database` the caller may query; empty when the database belongs to another tenant.
    pub fn datasources_accessible_by_user(&self, scope: &TenantScope, database: &Database, names: Vec<String>) -> Vec<String> {
        if tenant_check(scope, database) == TenantDecision::Deny {
            return Vec::new();
        }
        self.policy.datasources_accessible_by_user(scope, database, names)
    }

    /// Bulk listing. The tenant restriction goes into the catalog query; the base policy then filters.
    /// Excluded rows are dropped silently.
    pub async fn list_accessible(
        &self,
        scope: &TenantScope,
        catalog: &dyn ResourceCatalog,
        table: &ResourceTable,
    ) -> Result<Vec<ResourceRow>, AppError> {
        if scope.denies_unscoped_caller() {
            return Ok(Vec::new());
        }
        let filter = scope
            .tenant()
            .and_then(|t| tenant_filter(table, t, self.listings_include_unscoped));
        let rows = catalog.list(table, filter.as_ref()).await?;
        Ok(rows
            .into_iter()
            .filter(|r| self.policy.can_access(scope, r))
            .collect())
    }

    /// Fetch one resource and run the named-resource check on it.
    pub async fn get_accessible(
        &self,
        scope: &TenantScope,
        catalog: &dyn ResourceCatalog,
        table: &ResourceTable,
        id: &str,
    ) -> Result<ResourceRow, AppError> {
        let row = catalog
            .get(table, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", table.kind, id)))?;
        self.raise_for_access(scope, &row)?;
        Ok(row)
    }
}
