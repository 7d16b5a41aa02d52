//! Per-request tenant state: the resolved context and the scope handed to authorization.

use crate::principal::Principal;
use crate::tenant::TenantId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Which signal produced the tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    Header,
    Subdomain,
    IdentityClaim,
    ConfiguredDefault,
    None,
}

impl TenantSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantSource::Header => "header",
            TenantSource::Subdomain => "subdomain",
            TenantSource::IdentityClaim => "identity_claim",
            TenantSource::ConfiguredDefault => "configured_default",
            TenantSource::None => "none",
        }
    }
}

impl fmt::Display for TenantSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Written once at the start of a request and read-only afterwards. Never shared across requests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedTenantContext {
    tenant: Option<TenantId>,
    source: TenantSource,
    created_at: DateTime<Utc>,
}

impl ResolvedTenantContext {
    pub fn resolved(tenant: TenantId, source: TenantSource) -> Self {
        ResolvedTenantContext {
            tenant: Some(tenant),
            source,
            created_at: Utc::now(),
        }
    }

    pub fn unresolved() -> Self {
        ResolvedTenantContext {
            tenant: None,
            source: TenantSource::None,
            created_at: Utc::now(),
        }
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    pub fn tenant_str(&self) -> Option<&str> {
        self.tenant.as_ref().map(TenantId::as_str)
    }

    pub fn source(&self) -> TenantSource {
        self.source
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_resolved(&self) -> bool {
        self.tenant.is_some()
    }
}

/// What an authorization decision sees: the effective tenant plus the caller's standing.
///
/// An admin's impersonation header stands in for a missing resolved tenant. Non-admins
/// cannot impersonate.
#[derive(Clone, Debug)]
pub struct TenantScope {
    context: Arc<ResolvedTenantContext>,
    principal: Option<Arc<Principal>>,
    impersonated: Option<TenantId>,
    strict: bool,
}

impl TenantScope {
    pub fn new(context: Arc<ResolvedTenantContext>, principal: Option<Arc<Principal>>) -> Self {
        TenantScope {
            context,
            principal,
            impersonated: None,
            strict: false,
        }
    }

    /// Applies an impersonation header value. Ignored unless the caller is an admin and the value is non-empty.
    pub fn with_impersonation(mut self, header_value: Option<&str>) -> Self {
        let value = header_value.map(str::trim).filter(|s| !s.is_empty());
        self.impersonated = match value {
            Some(v) if self.is_admin() => Some(TenantId::new(v)),
            Some(_) => {
                tracing::warn!(
                    user = self.principal.as_deref().map(|p| p.username.as_str()).unwrap_or("anonymous"),
                    "ignoring impersonation header from non-admin caller"
                );
                None
            }
            None => None,
        };
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolved tenant, else the admin's impersonated tenant.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.context.tenant().or(self.impersonated.as_ref())
    }

    pub fn tenant_str(&self) -> Option<&str> {
        self.tenant().map(TenantId::as_str)
    }

    pub fn context(&self) -> &ResolvedTenantContext {
        &self.context
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.principal.as_deref().is_some_and(Principal::is_admin)
    }

    pub fn is_impersonating(&self) -> bool {
        self.context.tenant().is_none() && self.impersonated.is_some()
    }

    /// No tenant and not an admin, under strict mode: nothing tenant-scoped may be reached.
    pub fn denies_unscoped_caller(&self) -> bool {
        self.strict && self.tenant().is_none() && !self.is_admin()
    }
}
