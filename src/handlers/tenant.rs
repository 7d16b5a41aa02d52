//! Current-tenant introspection and admin tenant registry handlers.

use crate::context::TenantScope;
use crate::error::AppError;
use crate::extractors::CurrentTenant;
use crate::principal::Principal;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use crate::tenant::NewTenant;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

fn require_admin(scope: &TenantScope) -> Result<&Principal, AppError> {
    match scope.principal() {
        Some(p) if p.is_admin() => Ok(p),
        _ => Err(AppError::Forbidden("tenant administration requires the admin role".into())),
    }
}

fn checked_id<'a>(state: &AppState, tenant_id: &'a str) -> Result<&'a str, AppError> {
    if state.validator.is_valid(tenant_id) {
        Ok(tenant_id)
    } else {
        Err(AppError::BadRequest(format!("invalid tenant id: {}", tenant_id)))
    }
}

/// GET /tenant/current
pub async fn current(CurrentTenant(ctx): CurrentTenant, scope: TenantScope) -> impl IntoResponse {
    success_one_ok(serde_json::json!({
        "tenant_id": ctx.tenant_str(),
        "source": ctx.source(),
        "resolved_at": ctx.created_at(),
        "effective_tenant_id": scope.tenant_str(),
        "impersonating": scope.is_impersonating(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTenantsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /tenants
pub async fn list_tenants(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(q): Query<ListTenantsQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&scope)?;
    let tenants = state.directory.list(q.active_only).await?;
    Ok(success_many(tenants))
}

/// POST /tenants
pub async fn create_tenant(
    State(state): State<AppState>,
    scope: TenantScope,
    Json(body): Json<NewTenant>,
) -> Result<impl IntoResponse, AppError> {
    let actor = require_admin(&scope)?.id;
    let record = state.directory.create(body, actor).await?;
    Ok(success_one(record))
}

/// GET /tenants/:tenant_id
pub async fn get_tenant(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&scope)?;
    let tenant_id = checked_id(&state, &tenant_id)?;
    let record = state
        .directory
        .get(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tenant not found: {}", tenant_id)))?;
    Ok(success_one_ok(record))
}

/// DELETE /tenants/:tenant_id. Soft delete.
pub async fn deactivate_tenant(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let actor = require_admin(&scope)?.id;
    let tenant_id = checked_id(&state, &tenant_id)?;
    let record = state.directory.deactivate(tenant_id, actor).await?;
    Ok(success_one_ok(record))
}

/// DELETE /tenants/:tenant_id/cache
pub async fn invalidate_cache(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&scope)?;
    let tenant_id = checked_id(&state, &tenant_id)?;
    let removed = state.cache.invalidate_tenant(tenant_id).await?;
    Ok(success_one_ok(serde_json::json!({
        "tenant_id": tenant_id,
        "removed": removed,
    })))
}
