//! Tenant resolution: header, then subdomain, then identity claims, then the configured default.
//! First tier with a candidate wins. The registry is never consulted here.

use crate::config::TenancyConfig;
use crate::context::{ResolvedTenantContext, TenantSource};
use crate::principal::Principal;
use crate::tenant::TenantId;
use crate::validator::TenantValidator;
use axum::http::{header, request::Parts};
use std::net::IpAddr;

/// Subdomains that never name a tenant.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "static", "cdn"];

/// The request signals resolution reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestAttrs {
    pub host: Option<String>,
    pub tenant_header: Option<String>,
    pub impersonation_header: Option<String>,
}

impl RequestAttrs {
    pub fn from_parts(parts: &Parts, config: &TenancyConfig) -> Self {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.host().map(str::to_string));
        RequestAttrs {
            host,
            tenant_header: header_value(&config.tenant_header),
            impersonation_header: header_value(&config.impersonation_header),
        }
    }
}

#[derive(Clone)]
pub struct TenantResolver {
    config: TenancyConfig,
    validator: TenantValidator,
}

impl TenantResolver {
    pub fn new(config: TenancyConfig, validator: TenantValidator) -> Self {
        TenantResolver { config, validator }
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    pub fn resolve(&self, attrs: &RequestAttrs, principal: Option<&Principal>) -> ResolvedTenantContext {
        let candidate = header_candidate(attrs)
            .map(|t| (t, TenantSource::Header))
            .or_else(|| {
                self.subdomain_candidate(attrs.host.as_deref())
                    .map(|t| (t, TenantSource::Subdomain))
            })
            .or_else(|| {
                principal
                    .and_then(|p| self.claim_candidate(p))
                    .map(|t| (t, TenantSource::IdentityClaim))
            })
            .or_else(|| {
                self.config
                    .default_tenant_id
                    .clone()
                    .map(|t| (t, TenantSource::ConfiguredDefault))
            });

        match candidate {
            Some((tenant, source)) => {
                tracing::debug!(tenant = %tenant, source = %source, "resolved tenant");
                ResolvedTenantContext::resolved(TenantId::new(tenant), source)
            }
            None => {
                tracing::warn!(
                    host = attrs.host.as_deref().unwrap_or(""),
                    user = principal.map(|p| p.username.as_str()).unwrap_or("anonymous"),
                    "no tenant resolved for request"
                );
                ResolvedTenantContext::unresolved()
            }
        }
    }

    fn subdomain_candidate(&self, host: Option<&str>) -> Option<String> {
        if !self.config.enable_subdomain_routing {
            return None;
        }
        let label = subdomain_of(host?)?;
        if !self.validator.is_valid(&label) {
            tracing::debug!(subdomain = %label, "subdomain is not a valid tenant id");
            return None;
        }
        Some(label)
    }

    fn claim_candidate(&self, principal: &Principal) -> Option<String> {
        let direct = principal
            .tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let candidate = match direct {
            Some(t) => Some(t),
            None => match principal.claims.as_ref()?.tenant_hint() {
                Ok(hint) => hint,
                Err(e) => {
                    tracing::warn!(user = %principal.username, error = %e, "failed to extract tenant from identity claims");
                    None
                }
            },
        }?;
        if !self.validator.is_valid(&candidate) {
            tracing::debug!(user = %principal.username, "identity claim is not a valid tenant id");
            return None;
        }
        Some(candidate)
    }
}

/// Trimmed header value; blank counts as absent.
fn header_candidate(attrs: &RequestAttrs) -> Option<String> {
    attrs
        .tenant_header
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Leftmost label, lower-cased, when the host has more than two labels and the label is not reserved.
pub fn subdomain_of(host: &str) -> Option<String> {
    let host = strip_port(host.trim());
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return None;
    }
    let first = labels[0].to_lowercase();
    if first.is_empty() || RESERVED_SUBDOMAINS.contains(&first.as_str()) {
        return None;
    }
    Some(first)
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host;
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
