//! Current-tenant and admin registry routes.

use crate::handlers::tenant::{create_tenant, current, deactivate_tenant, get_tenant, invalidate_cache, list_tenants};
use crate::state::AppState;
use axum::{routing::delete, routing::get, Router};

pub fn tenant_routes(state: AppState) -> Router {
    Router::new()
        .route("/tenant/current", get(current))
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route("/tenants/:tenant_id", get(get_tenant).delete(deactivate_tenant))
        .route("/tenants/:tenant_id/cache", delete(invalidate_cache))
        .with_state(state)
}
