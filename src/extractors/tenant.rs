//! Read the tenant carrier written by [`crate::middleware::resolve_tenant`].

use crate::context::{ResolvedTenantContext, TenantScope};
use crate::error::AppError;
use crate::principal::Principal;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

fn carrier(parts: &Parts) -> Result<Arc<ResolvedTenantContext>, AppError> {
    parts
        .extensions
        .get::<Arc<ResolvedTenantContext>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("tenant context missing; resolve_tenant layer not installed".into()))
}

/// The resolved tenant context of this request.
#[derive(Clone, Debug)]
pub struct CurrentTenant(pub Arc<ResolvedTenantContext>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        carrier(parts).map(CurrentTenant)
    }
}

/// Builds the decision view: carrier, principal, the impersonation header and strict mode.
#[async_trait]
impl FromRequestParts<AppState> for TenantScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = carrier(parts)?;
        let principal = parts.extensions.get::<Arc<Principal>>().cloned();
        let impersonation = parts
            .headers
            .get(state.config.impersonation_header.as_str())
            .and_then(|v| v.to_str().ok());
        Ok(TenantScope::new(ctx, principal)
            .with_impersonation(impersonation)
            .with_strict(state.config.strict_mode))
    }
}
