//! Protected-resource reads through the tenant gate.

use crate::authz::ResourceKind;
use crate::context::TenantScope;
use crate::error::AppError;
use crate::qualifier::ResourceTable;
use crate::response::{success_many, success_one_ok};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

fn table_for(segment: &str) -> Result<&'static ResourceTable, AppError> {
    ResourceKind::from_path_segment(segment)
        .map(ResourceTable::for_kind)
        .ok_or_else(|| AppError::NotFound(format!("unknown resource kind: {}", segment)))
}

/// GET /resources/:kind. Rows of other tenants are left out silently.
pub async fn list(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let table = table_for(&segment)?;
    let rows = state
        .gate
        .list_accessible(&scope, state.catalog.as_ref(), table)
        .await?;
    tracing::debug!(kind = %table.kind, tenant = scope.tenant_str().unwrap_or("none"), count = rows.len(), "listed resources");
    Ok(success_many(rows))
}

/// GET /resources/:kind/:id. Another tenant's resource is a 403 naming the resource.
pub async fn read(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let table = table_for(&segment)?;
    let row = state
        .gate
        .get_accessible(&scope, state.catalog.as_ref(), table, &id)
        .await?;
    Ok(success_one_ok(row))
}
